use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a tree name, matching the storage column width.
pub const MAX_NAME_LEN: usize = 255;

/// The seven weekdays a garden record can be filed under.
///
/// Each entry carries a display label (the variant name), a stable two-letter
/// storage code, and an ISO-8601 ordinal (Monday = 1 .. Sunday = 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A weekday label, storage code, or ordinal outside the fixed set of 7.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weekday: {0}")]
pub struct UnknownWeekday(pub String);

impl Weekday {
    /// All weekdays in ISO order (Monday first).
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Display label shown to users and accepted as input.
    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Short code persisted in the store, distinct from the label.
    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "mn",
            Weekday::Tuesday => "ts",
            Weekday::Wednesday => "wn",
            Weekday::Thursday => "th",
            Weekday::Friday => "fr",
            Weekday::Saturday => "st",
            Weekday::Sunday => "sn",
        }
    }

    /// ISO-8601 weekday number (Monday = 1 .. Sunday = 7).
    pub fn iso(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_label(label: &str) -> Result<Self, UnknownWeekday> {
        Self::ALL
            .into_iter()
            .find(|day| day.label() == label)
            .ok_or_else(|| UnknownWeekday(label.to_string()))
    }

    pub fn from_code(code: &str) -> Result<Self, UnknownWeekday> {
        Self::ALL
            .into_iter()
            .find(|day| day.code() == code)
            .ok_or_else(|| UnknownWeekday(code.to_string()))
    }

    pub fn from_iso(ordinal: u32) -> Result<Self, UnknownWeekday> {
        Self::ALL
            .into_iter()
            .find(|day| day.iso() == ordinal)
            .ok_or_else(|| UnknownWeekday(ordinal.to_string()))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Request payload for creating a garden record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    /// Weekday display label, e.g. "Monday"
    pub day_of_the_week: String,
    /// The tree's name (non-empty, max 255 characters)
    pub name: String,
    /// Number of fruits counted (non-negative)
    pub fruits_num: i64,
}

/// Request payload for a partial update of a garden record.
///
/// Unset fields are left unchanged in the stored record, never overwritten
/// with empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_the_week: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fruits_num: Option<i64>,
}

/// A stored record as returned by the list operation, with the weekday
/// translated back to its display label and last week's temperature attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub id: i64,
    pub day_of_the_week: String,
    pub name: String,
    pub fruits_num: i64,
    /// Max temperature recorded for this weekday during the past week
    pub temperature: f64,
}

/// A single validation failure, naming the offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A create payload that passed validation, with the weekday resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub day_of_the_week: Weekday,
    pub name: String,
    pub fruits_num: i64,
}

/// A validated partial update. Only set fields are written to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub day_of_the_week: Option<Weekday>,
    pub name: Option<String>,
    pub fruits_num: Option<i64>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.day_of_the_week.is_none() && self.name.is_none() && self.fruits_num.is_none()
    }
}

fn check_name(name: &str) -> Result<String, FieldError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(FieldError::new(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn check_fruits_num(fruits_num: i64) -> Result<i64, FieldError> {
    if fruits_num < 0 {
        return Err(FieldError::new("fruits_num", "must not be negative"));
    }
    Ok(fruits_num)
}

fn check_weekday(label: &str) -> Result<Weekday, FieldError> {
    Weekday::from_label(label)
        .map_err(|err| FieldError::new("day_of_the_week", err.to_string()))
}

/// Validate a create request, collecting every failing field.
pub fn validate_create(request: &CreateRecordRequest) -> Result<ValidatedRecord, Vec<FieldError>> {
    let mut errors = Vec::new();

    let day_of_the_week = check_weekday(&request.day_of_the_week)
        .map_err(|e| errors.push(e))
        .ok();
    let name = check_name(&request.name).map_err(|e| errors.push(e)).ok();
    let fruits_num = check_fruits_num(request.fruits_num)
        .map_err(|e| errors.push(e))
        .ok();

    match (day_of_the_week, name, fruits_num) {
        (Some(day_of_the_week), Some(name), Some(fruits_num)) => Ok(ValidatedRecord {
            day_of_the_week,
            name,
            fruits_num,
        }),
        _ => Err(errors),
    }
}

/// Validate a partial update request. Unset fields are skipped; set fields
/// obey the same rules as on create.
pub fn validate_update(request: &UpdateRecordRequest) -> Result<RecordPatch, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut patch = RecordPatch::default();

    if let Some(label) = &request.day_of_the_week {
        match check_weekday(label) {
            Ok(day) => patch.day_of_the_week = Some(day),
            Err(e) => errors.push(e),
        }
    }
    if let Some(name) = &request.name {
        match check_name(name) {
            Ok(name) => patch.name = Some(name),
            Err(e) => errors.push(e),
        }
    }
    if let Some(fruits_num) = request.fruits_num {
        match check_fruits_num(fruits_num) {
            Ok(fruits_num) => patch.fruits_num = Some(fruits_num),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}
