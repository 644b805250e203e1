use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::Path;

use super::error::{CoreError, CoreResult};
use super::types::{
    is_valid_value, normalize_dimension_name, now_millis, Dimension, IdGenerator, RadarProfile,
};

// ── CSV Export / Import ──────────────────────────────────────────────────────
//
// Layout of an exported file:
//
//   profile_name,<dim 1>,...,<dim N>,created_at,updated_at
//   "Alice",3,4,...,2024-01-02T03:04:05.678Z,2024-01-02T03:04:05.678Z
//
// Only the name column is quoted.  Dimension names come from the first
// profile; every profile is assumed to share them.  On import the trailing
// timestamp columns are optional and their values are not restored.

pub const NAME_COLUMN: &str = "profile_name";
pub const CREATED_COLUMN: &str = "created_at";
pub const UPDATED_COLUMN: &str = "updated_at";

pub const DEFAULT_EXPORT_FILENAME: &str = "Hexagon Radar Data.csv";

const BOM: char = '\u{feff}';

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render profiles as CSV text.  An empty slice yields an empty string.
pub fn export_to_csv(profiles: &[RadarProfile]) -> String {
    let Some(first) = profiles.first() else {
        return String::new();
    };

    let mut header: Vec<&str> = vec![NAME_COLUMN];
    header.extend(first.dimensions.iter().map(|d| d.name.as_str()));
    header.push(CREATED_COLUMN);
    header.push(UPDATED_COLUMN);

    let mut lines = Vec::with_capacity(profiles.len() + 1);
    lines.push(header.join(","));

    for profile in profiles {
        let mut fields = Vec::with_capacity(profile.dimensions.len() + 3);
        fields.push(quote_field(&profile.name));
        fields.extend(profile.dimensions.iter().map(|d| d.value.to_string()));
        fields.push(format_timestamp(profile.created_at));
        fields.push(format_timestamp(profile.updated_at));
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// Write an export file prefixed with a UTF-8 byte-order mark so spreadsheet
/// tools pick the right encoding.
pub fn write_csv_file(path: &Path, profiles: &[RadarProfile]) -> CoreResult<()> {
    let content = export_to_csv(profiles);
    if content.is_empty() {
        return Err(CoreError::validation("No profiles to export"));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut body = String::with_capacity(content.len() + BOM.len_utf8());
    body.push(BOM);
    body.push_str(&content);
    fs::write(path, body)?;
    Ok(())
}

/// Split one CSV line into fields.
///
/// A `""` pair inside a quoted field is a literal quote; commas inside
/// quotes do not separate fields; the last field is always emitted.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    result.push(current);
    result
}

/// Number of trailing metadata columns in a header row.
fn trailing_metadata_columns(headers: &[String]) -> usize {
    let mut count = 0;
    for label in headers.iter().skip(1).rev() {
        let label = label.trim();
        let expected = if count == 0 { UPDATED_COLUMN } else { CREATED_COLUMN };
        if count < 2 && label == expected {
            count += 1;
        } else {
            break;
        }
    }
    // created_at alone (no updated_at after it) still counts as metadata.
    if count == 0 && headers.len() > 1 && headers[headers.len() - 1].trim() == CREATED_COLUMN {
        count = 1;
    }
    count
}

fn parse_value(raw: &str, line_no: usize) -> CoreResult<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|v| is_valid_value(*v))
        .ok_or_else(|| {
            CoreError::validation(format!(
                "Line {} contains an invalid dimension value: {}",
                line_no, raw
            ))
        })
}

/// Parse CSV text into new profiles, using the current time.
pub fn import_from_csv(content: &str, ids: &mut IdGenerator) -> CoreResult<Vec<RadarProfile>> {
    import_from_csv_at(content, ids, now_millis())
}

/// Parse CSV text into new profiles stamped with `now`.
///
/// Any error aborts the whole import; no partial result is returned.
pub fn import_from_csv_at(
    content: &str,
    ids: &mut IdGenerator,
    now: i64,
) -> CoreResult<Vec<RadarProfile>> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let lines: Vec<(usize, &str)> = content
        .trim()
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(CoreError::validation("CSV file is empty or malformed"));
    }

    let headers: Vec<String> = parse_csv_line(lines[0].1)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.len() < 3 || headers[0] != NAME_COLUMN {
        return Err(CoreError::validation(
            "CSV header is malformed or missing required columns",
        ));
    }

    let metadata = trailing_metadata_columns(&headers);
    let dimension_names = &headers[1..headers.len() - metadata];
    if dimension_names.is_empty() {
        return Err(CoreError::validation("CSV file contains no dimensions"));
    }
    for name in dimension_names {
        normalize_dimension_name(name)?;
    }

    let mut profiles = Vec::new();
    for &(line_no, line) in &lines[1..] {
        let values = parse_csv_line(line);
        if values.len() != headers.len() {
            return Err(CoreError::validation(format!(
                "Line {} has {} columns, expected {}",
                line_no,
                values.len(),
                headers.len()
            )));
        }

        let dimensions = dimension_names
            .iter()
            .zip(&values[1..=dimension_names.len()])
            .map(|(name, raw)| -> CoreResult<Dimension> {
                Ok(Dimension::new(name.clone(), parse_value(raw, line_no)?))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        profiles.push(RadarProfile {
            id: ids.next_id_at(now),
            name: values[0].clone(),
            dimensions,
            created_at: now,
            updated_at: now,
        });
    }

    if profiles.is_empty() {
        return Err(CoreError::validation("CSV file contains no data rows"));
    }

    Ok(profiles)
}
