use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};

// ── Scale ────────────────────────────────────────────────────────────────────

pub const MIN_VALUE: u8 = 1;
pub const MAX_VALUE: u8 = 5;
/// Value every dimension starts at when a profile is created.
pub const DEFAULT_VALUE: u8 = 3;

/// Name given to the profile synthesized when the last one is deleted.
pub const SENTINEL_PROFILE_NAME: &str = "New Profile";

pub const DEFAULT_DIMENSIONS: [&str; 6] = [
    "Business Analysis",
    "Engineering",
    "Modeling",
    "Learning",
    "Initiative",
    "Communication",
];

pub fn default_dimension_names() -> Vec<String> {
    DEFAULT_DIMENSIONS.iter().map(|s| s.to_string()).collect()
}

pub fn is_valid_value(value: u8) -> bool {
    (MIN_VALUE..=MAX_VALUE).contains(&value)
}

// ── Data Structures ──────────────────────────────────────────────────────────

/// One named score within a profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: u8,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: u8) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A named, ordered set of scored dimensions.
///
/// Field names serialize in camelCase; the persisted collection is a JSON
/// array of these records and other readers of the store depend on that
/// shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RadarProfile {
    pub id: String,
    pub name: String,
    pub dimensions: Vec<Dimension>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

impl RadarProfile {
    /// Mean score rounded to one decimal, as shown in the profile list.
    pub fn average_value(&self) -> f64 {
        if self.dimensions.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.dimensions.iter().map(|d| d.value as u32).sum();
        let avg = sum as f64 / self.dimensions.len() as f64;
        (avg * 10.0).round() / 10.0
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            average: self.average_value(),
            updated_at: self.updated_at,
        }
    }
}

/// List-row view of a profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub average: f64,
    pub updated_at: i64,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Trim a user-supplied name, rejecting it when nothing is left.
pub fn normalize_name(name: &str, what: &str) -> CoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

/// Profile names travel in a quoted CSV field, which cannot span lines.
pub fn normalize_profile_name(name: &str) -> CoreResult<String> {
    let name = normalize_name(name, "Profile name")?;
    if name.contains(['\n', '\r']) {
        return Err(CoreError::validation("Profile name must not contain line breaks"));
    }
    Ok(name)
}

/// Dimension names form the unquoted CSV header.
pub fn normalize_dimension_name(name: &str) -> CoreResult<String> {
    let name = normalize_name(name, "Dimension name")?;
    check_dimension_name(&name)?;
    Ok(name)
}

fn check_dimension_name(name: &str) -> CoreResult<()> {
    if name.contains(['\n', '\r', ',', '"']) {
        return Err(CoreError::validation(format!(
            "Dimension name '{}' must not contain commas, quotes or line breaks",
            name.escape_default()
        )));
    }
    Ok(())
}

pub fn validate_dimensions(dimensions: &[Dimension]) -> CoreResult<()> {
    if dimensions.is_empty() {
        return Err(CoreError::validation("A profile needs at least one dimension"));
    }
    for (idx, dim) in dimensions.iter().enumerate() {
        if dim.name.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "Dimension {} has an empty name",
                idx + 1
            )));
        }
        check_dimension_name(&dim.name)?;
        if !is_valid_value(dim.value) {
            return Err(CoreError::validation(format!(
                "Dimension '{}' has value {} outside {}-{}",
                dim.name, dim.value, MIN_VALUE, MAX_VALUE
            )));
        }
    }
    Ok(())
}

/// Invariants a stored or imported profile must satisfy.
pub fn validate_profile(profile: &RadarProfile) -> CoreResult<()> {
    if profile.id.is_empty() {
        return Err(CoreError::validation("Profile id must not be empty"));
    }
    if profile.name.contains(['\n', '\r']) {
        return Err(CoreError::validation("Profile name must not contain line breaks"));
    }
    validate_dimensions(&profile.dimensions)
}

// ── Ids & Time ───────────────────────────────────────────────────────────────

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Hands out time-based profile ids.
///
/// The first id in a millisecond is the bare timestamp; further ids in the
/// same millisecond (a CSV import, a quick double-click) get a `-N` suffix.
/// The clock is never allowed to run backwards between calls.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last_millis: i64,
    seq: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id_at(&mut self, millis: i64) -> String {
        if millis > self.last_millis {
            self.last_millis = millis;
            self.seq = 0;
            return millis.to_string();
        }
        self.seq += 1;
        format!("{}-{}", self.last_millis, self.seq)
    }
}

// ── Samples ──────────────────────────────────────────────────────────────────

/// Profiles a fresh install starts with.
pub fn sample_profiles(ids: &mut IdGenerator, now: i64) -> Vec<RadarProfile> {
    let samples: [(&str, [u8; 6]); 3] = [
        ("Alice - Frontend Engineer", [3, 4, 3, 4, 5, 4]),
        ("Bob - Backend Engineer", [4, 5, 4, 4, 4, 3]),
        ("Carol - Product Manager", [5, 2, 3, 3, 4, 5]),
    ];

    samples
        .iter()
        .map(|(name, values)| RadarProfile {
            id: ids.next_id_at(now),
            name: name.to_string(),
            dimensions: DEFAULT_DIMENSIONS
                .iter()
                .zip(values.iter())
                .map(|(dim, value)| Dimension::new(*dim, *value))
                .collect(),
            created_at: now,
            updated_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = RadarProfile {
            id: "1".into(),
            name: "x".into(),
            dimensions: vec![Dimension::new("A", 2)],
            created_at: 10,
            updated_at: 20,
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "name": "x",
                "dimensions": [{"name": "A", "value": 2}],
                "createdAt": 10,
                "updatedAt": 20
            })
        );
    }

    #[test]
    fn test_id_generator_disambiguates_same_millisecond() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id_at(1000), "1000");
        assert_eq!(ids.next_id_at(1000), "1000-1");
        assert_eq!(ids.next_id_at(999), "1000-2");
        assert_eq!(ids.next_id_at(1001), "1001");
    }

    #[test]
    fn test_average_value_rounds_to_one_decimal() {
        let profile = RadarProfile {
            id: "1".into(),
            name: "x".into(),
            dimensions: vec![
                Dimension::new("A", 1),
                Dimension::new("B", 2),
                Dimension::new("C", 2),
            ],
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(profile.average_value(), 1.7);
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(validate_dimensions(&[]).is_err());
        assert!(validate_dimensions(&[Dimension::new(" ", 3)]).is_err());
        assert!(validate_dimensions(&[Dimension::new("A", 0)]).is_err());
        assert!(validate_dimensions(&[Dimension::new("A", 6)]).is_err());
        assert!(validate_dimensions(&[Dimension::new("A", 5)]).is_ok());
    }

    #[test]
    fn test_profile_names_reject_line_breaks() {
        assert_eq!(normalize_profile_name("  Dana ").unwrap(), "Dana");
        assert!(normalize_profile_name("a\nb").unwrap_err().is_validation());
        assert!(normalize_profile_name("a\rb").is_err());
        // Commas and quotes are fine: the name column is quoted.
        assert!(normalize_profile_name("Say \"hi\", Bob").is_ok());
    }

    #[test]
    fn test_dimension_names_reject_csv_delimiters() {
        assert_eq!(normalize_dimension_name(" Speed ").unwrap(), "Speed");
        for bad in ["Speed, Agility", "The \"Edge\"", "a\nb", "a\rb"] {
            assert!(normalize_dimension_name(bad).unwrap_err().is_validation(), "{}", bad);
            assert!(validate_dimensions(&[Dimension::new(bad, 3)]).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_validate_profile() {
        let good = RadarProfile {
            id: "1".into(),
            name: "x".into(),
            dimensions: vec![Dimension::new("A", 3)],
            created_at: 1,
            updated_at: 2,
        };
        assert!(validate_profile(&good).is_ok());
        for bad in [
            RadarProfile { id: String::new(), ..good.clone() },
            RadarProfile { dimensions: vec![Dimension::new("A", 7)], ..good.clone() },
            RadarProfile { dimensions: vec![], ..good.clone() },
            RadarProfile { name: "a\nb".into(), ..good.clone() },
        ] {
            assert!(validate_profile(&bad).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_sample_profiles_have_unique_ids() {
        let mut ids = IdGenerator::new();
        let samples = sample_profiles(&mut ids, 5000);
        assert_eq!(samples.len(), 3);
        assert_ne!(samples[0].id, samples[1].id);
        assert_ne!(samples[1].id, samples[2].id);
        assert!(samples.iter().all(|p| p.dimensions.len() == 6));
    }
}
