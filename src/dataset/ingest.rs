//! Conversion of raw input into records
//!
//! Two inputs are understood:
//! - handoff rows: a JSON array already in [`Section`] / [`Room`] shape
//! - per-course documents: `{"result": [ ... ]}` objects as published by the
//!   registrar, one file per course
//!
//! Archive extraction and room HTML/geolocation scraping happen upstream.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use super::errors::{DatasetError, DatasetResult};
use super::kind::DatasetKind;
use super::record::{Record, Room, Section};

/// Year assigned to the aggregate "overall" pseudo-section of a course
pub const OVERALL_SECTION_YEAR: i64 = 1900;

/// Parses handoff-shaped rows for the given kind.
pub fn records_from_json(kind: DatasetKind, rows: Value) -> DatasetResult<Vec<Record>> {
    if !rows.is_array() {
        return Err(DatasetError::malformed_records("Rows must be a JSON array"));
    }
    let records = match kind {
        DatasetKind::Sections => serde_json::from_value::<Vec<Section>>(rows)
            .map_err(|e| DatasetError::malformed_records(format!("Invalid section row: {}", e)))?
            .into_iter()
            .map(Record::from)
            .collect(),
        DatasetKind::Rooms => serde_json::from_value::<Vec<Room>>(rows)
            .map_err(|e| DatasetError::malformed_records(format!("Invalid room row: {}", e)))?
            .into_iter()
            .map(Record::from)
            .collect(),
    };
    Ok(records)
}

/// Extracts the valid sections of one per-course document.
///
/// Unparsable documents and malformed entries yield nothing rather than an
/// error; a course file with no usable sections simply contributes no rows.
pub fn sections_from_course_document(text: &str) -> Vec<Section> {
    let document: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let entries = match document.get("result").and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Vec::new(),
    };
    entries.iter().filter_map(section_from_entry).collect()
}

/// Reads every course document in a directory, in file-name order.
///
/// File names containing spaces, dots or commas are skipped.
pub fn sections_from_course_dir(dir: &Path) -> io::Result<Vec<Section>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let valid_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| !n.is_empty() && !n.contains([' ', '.', ',']))
            .unwrap_or(false);
        if valid_name {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sections = Vec::new();
    for path in paths {
        let text = fs::read_to_string(&path)?;
        sections.extend(sections_from_course_document(&text));
    }
    Ok(sections)
}

fn section_from_entry(entry: &Value) -> Option<Section> {
    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
    let number = |key: &str| entry.get(key).and_then(Value::as_f64);

    let uuid = match entry.get("id")? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64()?.to_string(),
        },
        _ => return None,
    };
    let year = match entry.get("Year")? {
        Value::Number(n) => n.as_f64()? as i64,
        Value::String(s) => s.trim().parse::<f64>().ok()? as i64,
        _ => return None,
    };
    let section_label = text("Section")?;

    Some(Section {
        dept: text("Subject")?,
        id: text("Course")?,
        instructor: text("Professor")?,
        title: text("Title")?,
        avg: number("Avg")?,
        pass: number("Pass")? as i64,
        fail: number("Fail")? as i64,
        audit: number("Audit")? as i64,
        uuid,
        year: if section_label.eq_ignore_ascii_case("overall") {
            OVERALL_SECTION_YEAR
        } else {
            year
        },
    })
}
