//! Run outcome notifications

use filer_config::NotificationSettings;
use tracing::info;

/// Delivers run notifications to configured recipients
pub trait Notifier: Send + Sync {
    /// Send one notification
    fn notify(&self, recipients: &[String], subject: &str, body: &str);
}

/// Notifier that records deliveries in the log
///
/// Deployments wire a real mail/chat notifier here; the pipeline only
/// depends on the trait.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipients: &[String], subject: &str, body: &str) {
        info!(
            recipients = recipients.join(",").as_str(),
            subject,
            body,
            "notification sent"
        );
    }
}

/// Apply the notification settings to a run outcome
pub(crate) fn notify_outcome(
    notifier: &dyn Notifier,
    settings: &NotificationSettings,
    succeeded: bool,
    subject: &str,
    body: &str,
) {
    if settings.recipients.is_empty() {
        return;
    }
    let wanted = if succeeded {
        settings.on_success
    } else {
        settings.on_failure
    };
    if wanted {
        notifier.notify(&settings.recipients, subject, body);
    }
}
