//! Per-target payload rendering
//!
//! Renders a report instance into the format its target expects. JSON is
//! the canonical form; XML is built with quick-xml; the excel format is
//! rendered as CSV (consumed by spreadsheet tooling); pdf produces a
//! minimal single-page document carrying the report summary.

use crate::{Result, SubmitError};
use filer_config::PayloadFormat;
use filer_report::ReportInstance;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

/// Render the instance payload in the requested format
pub fn render(instance: &ReportInstance, format: PayloadFormat) -> Result<Vec<u8>> {
    match format {
        PayloadFormat::Json => render_json(instance),
        PayloadFormat::Xml => render_xml(instance),
        PayloadFormat::Excel => Ok(render_csv(instance)),
        PayloadFormat::Pdf => Ok(render_pdf(instance)),
    }
}

fn render_json(instance: &ReportInstance) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(&instance.payload).map_err(|e| SubmitError::Render {
        format: "json",
        message: e.to_string(),
    })
}

fn render_xml(instance: &ReportInstance) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("report");
    root.push_attribute(("id", instance.id.as_str()));
    root.push_attribute(("config", instance.config_id.as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    let mut period = BytesStart::new("period");
    period.push_attribute(("start", instance.period.start.to_rfc3339().as_str()));
    period.push_attribute(("end", instance.period.end.to_rfc3339().as_str()));
    writer.write_event(Event::Empty(period)).map_err(xml_err)?;

    write_xml_value(&mut writer, "body", &instance.payload)?;

    writer
        .write_event(Event::End(BytesEnd::new("report")))
        .map_err(xml_err)?;

    Ok(writer.into_inner())
}

fn xml_err<E: std::fmt::Display>(e: E) -> SubmitError {
    SubmitError::Render {
        format: "xml",
        message: e.to_string(),
    }
}

fn write_xml_value(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    let name = sanitize_element_name(name);
    match value {
        Value::Object(map) => {
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(xml_err)?;
            for (key, child) in map {
                write_xml_value(writer, key, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(xml_err)?;
        }
        Value::Array(items) => {
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(xml_err)?;
            for item in items {
                write_xml_value(writer, "item", item)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(xml_err)?;
        }
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(name.as_str())))
                .map_err(xml_err)?;
        }
        scalar => {
            let text = match scalar {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(xml_err)?;
        }
    }
    Ok(())
}

/// XML element names cannot carry dots or spaces from field names
fn sanitize_element_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("f{}", cleaned)
    } else if cleaned.is_empty() {
        "field".to_string()
    } else {
        cleaned
    }
}

/// CSV rendering: one section per data field, records as rows
fn render_csv(instance: &ReportInstance) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!(
        "report_id,{}\r\nconfig,{}\r\nperiod_start,{}\r\nperiod_end,{}\r\n",
        csv_escape(&instance.id),
        csv_escape(&instance.config_id),
        instance.period.start.to_rfc3339(),
        instance.period.end.to_rfc3339(),
    ));

    if let Some(Value::Object(data)) = instance.payload.get("data") {
        for (section, records) in data {
            let Value::Array(records) = records else { continue };
            out.push_str("\r\n");
            out.push_str(&csv_escape(section));
            out.push_str("\r\n");

            // Stable header from the union of field names
            let mut headers: Vec<String> = Vec::new();
            for record in records {
                if let Some(fields) = record.get("fields").and_then(Value::as_object) {
                    for key in fields.keys() {
                        if !headers.contains(key) {
                            headers.push(key.clone());
                        }
                    }
                }
            }
            headers.sort();
            out.push_str(&headers.iter().map(|h| csv_escape(h)).collect::<Vec<_>>().join(","));
            out.push_str("\r\n");

            for record in records {
                let fields = record.get("fields").and_then(Value::as_object);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        fields
                            .and_then(|f| f.get(h))
                            .map(|v| match v {
                                Value::String(s) => csv_escape(s),
                                other => csv_escape(&other.to_string()),
                            })
                            .unwrap_or_default()
                    })
                    .collect();
                out.push_str(&row.join(","));
                out.push_str("\r\n");
            }
        }
    }

    out.into_bytes()
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Minimal single-page PDF carrying the report summary lines
fn render_pdf(instance: &ReportInstance) -> Vec<u8> {
    let lines = [
        format!("Report {}", instance.id),
        format!("Configuration: {}", instance.config_id),
        format!(
            "Period: {} to {}",
            instance.period.start.format("%Y-%m-%d"),
            instance.period.end.format("%Y-%m-%d")
        ),
        format!("Quality score: {:.1}", instance.quality_score),
    ];

    let mut content = String::from("BT /F1 12 Tf 72 760 Td 16 TL\n");
    for line in &lines {
        content.push_str(&format!("({}) Tj T*\n", pdf_escape(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, object));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}

fn pdf_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
