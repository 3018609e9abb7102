//! Tests for payload rendering

use super::*;
use filer_record::{Record, ReportingPeriod};
use filer_report::{InstanceStatus, ReportInstance};
use serde_json::json;

fn instance() -> ReportInstance {
    let now = "2024-04-05T00:00:00Z".parse().unwrap();
    let mut record = Record::new("2024-03-15T00:00:00Z".parse().unwrap());
    record.set("severity", json!(3));
    record.set("title", json!("Outage, partial"));

    ReportInstance {
        id: "rpt-osfi-20240101-0001".into(),
        config_id: "osfi_q".into(),
        period: ReportingPeriod::new(
            "2024-01-01T00:00:00Z".parse().unwrap(),
            "2024-03-31T23:59:59Z".parse().unwrap(),
        ),
        due_date: "2024-04-30T00:00:00Z".parse().unwrap(),
        status: InstanceStatus::Generated,
        payload: json!({
            "report": "OSFI quarterly",
            "data": { "incidents": [record] }
        }),
        source_counts: Vec::new(),
        quality_score: 97.5,
        validation_results: Vec::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
        artifacts: Vec::new(),
        submissions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_json_payload_is_the_canonical_form() {
    let bytes = render(&instance(), filer_config::PayloadFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["report"], "OSFI quarterly");
    assert_eq!(parsed["data"]["incidents"][0]["fields"]["severity"], 3);
}

#[test]
fn test_xml_payload_has_report_envelope() {
    let bytes = render(&instance(), filer_config::PayloadFormat::Xml).unwrap();
    let xml = String::from_utf8(bytes).unwrap();

    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<report id=\"rpt-osfi-20240101-0001\""));
    assert!(xml.contains("<period"));
    assert!(xml.contains("<incidents>"));
    assert!(xml.contains("<severity>3</severity>"));
}

#[test]
fn test_csv_payload_has_section_and_rows() {
    let bytes = render(&instance(), filer_config::PayloadFormat::Excel).unwrap();
    let csv = String::from_utf8(bytes).unwrap();

    assert!(csv.contains("report_id,rpt-osfi-20240101-0001"));
    assert!(csv.contains("incidents"));
    assert!(csv.contains("severity,title"));
    // Comma inside a value is quoted
    assert!(csv.contains("\"Outage, partial\""));
}

#[test]
fn test_pdf_payload_is_well_formed() {
    let bytes = render(&instance(), filer_config::PayloadFormat::Pdf).unwrap();
    let pdf = String::from_utf8(bytes).unwrap();

    assert!(pdf.starts_with("%PDF-1.4"));
    assert!(pdf.ends_with("%%EOF\n"));
    assert!(pdf.contains("Report rpt-osfi-20240101-0001"));
    assert!(pdf.contains("Quality score: 97.5"));
}

#[test]
fn test_xml_element_names_are_sanitized() {
    let mut inst = instance();
    inst.payload = json!({ "vendor.rating": 2, "9lives": "x" });
    let xml = String::from_utf8(render(&inst, filer_config::PayloadFormat::Xml).unwrap()).unwrap();

    assert!(xml.contains("<vendor_rating>"));
    assert!(xml.contains("<f9lives>"));
}
