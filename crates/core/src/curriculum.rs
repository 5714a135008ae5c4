//! Curriculum entity kinds and their payloads.
//!
//! The lifecycle engine treats payloads as opaque blobs that are copied
//! verbatim on branching. This module gives each kind a typed payload so
//! drafts are shape-checked on every write and completeness-checked on
//! submission.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

pub const KIND_COURSE: &str = "course";
pub const KIND_DEGREE: &str = "degree";

/// The closed set of versioned curriculum entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    Degree,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Course, EntityKind::Degree];

    /// Storage name (the `kind` column).
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Course => KIND_COURSE,
            EntityKind::Degree => KIND_DEGREE,
        }
    }

    /// Human-readable name used in messages and audit descriptions.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Course => "Course",
            EntityKind::Degree => "Degree",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KIND_COURSE => Ok(EntityKind::Course),
            KIND_DEGREE => Ok(EntityKind::Degree),
            other => Err(CoreError::Validation(format!(
                "Invalid entity kind '{other}'. Must be one of: {KIND_COURSE}, {KIND_DEGREE}"
            ))),
        }
    }
}

impl TryFrom<String> for EntityKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Family codes
// ---------------------------------------------------------------------------

/// Maximum length of a family code such as `CS101`.
pub const MAX_CODE_LENGTH: usize = 20;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_-]+$").expect("valid regex"));

/// Validate a family code: 2 to [`MAX_CODE_LENGTH`] characters, uppercase
/// letters, digits, `-` or `_`, starting with a letter.
pub fn validate_code(code: &str) -> Result<(), CoreError> {
    if code.len() > MAX_CODE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Code must not exceed {MAX_CODE_LENGTH} characters, got {}",
            code.len()
        )));
    }
    if !CODE_RE.is_match(code) {
        return Err(CoreError::Validation(format!(
            "Invalid code '{code}'. Use 2-{MAX_CODE_LENGTH} uppercase letters, digits, \
             '-' or '_', starting with a letter"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Shared behaviour of kind-specific payloads.
///
/// Payload structs use `#[serde(default)]` so drafts can be saved while
/// incomplete; [`CurriculumPayload::check_complete`] is the submission gate.
pub trait CurriculumPayload:
    Serialize + DeserializeOwned + Validate + Default + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn name(&self) -> &str;

    /// Checks that cannot be expressed as derived field rules.
    fn extra_problems(&self) -> Vec<String> {
        Vec::new()
    }

    fn check_complete(&self) -> Result<(), CoreError> {
        let mut problems = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_messages(&errors),
        };
        if self.name().trim().is_empty() && problems.iter().all(|p| !p.starts_with("name")) {
            problems.push("name must not be blank".to_string());
        }
        problems.extend(self.extra_problems());

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "{} is incomplete: {}",
                Self::KIND,
                problems.join("; ")
            )))
        }
    }
}

/// Payload of a course version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct CoursePayload {
    #[validate(length(min = 1, max = 200, message = "name is required (at most 200 characters)"))]
    pub name: String,
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: String,
    #[validate(range(min = 1, max = 60, message = "credits must be between 1 and 60"))]
    pub credits: i32,
    /// Curriculum text, stored as authored (rich text is opaque here).
    #[validate(length(min = 1, message = "curriculum is required"))]
    pub curriculum: String,
    /// Codes of prerequisite courses.
    pub prerequisites: Vec<String>,
    pub learning_outcomes: Vec<String>,
}

impl CurriculumPayload for CoursePayload {
    const KIND: EntityKind = EntityKind::Course;

    fn name(&self) -> &str {
        &self.name
    }

    fn extra_problems(&self) -> Vec<String> {
        code_list_problems("prerequisites", &self.prerequisites)
    }
}

/// Payload of a degree program version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct DegreePayload {
    #[validate(length(min = 1, max = 200, message = "name is required (at most 200 characters)"))]
    pub name: String,
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: String,
    /// Award type, e.g. `BSc` or `MEng`.
    #[validate(length(min = 1, max = 50, message = "degree_type is required"))]
    pub degree_type: String,
    #[validate(range(min = 1, max = 10, message = "duration_years must be between 1 and 10"))]
    pub duration_years: i32,
    #[validate(range(min = 1, max = 600, message = "total_credits must be between 1 and 600"))]
    pub total_credits: i32,
    /// Codes of the courses that make up the program.
    #[validate(length(min = 1, message = "course_codes must list at least one course"))]
    pub course_codes: Vec<String>,
}

impl CurriculumPayload for DegreePayload {
    const KIND: EntityKind = EntityKind::Degree;

    fn name(&self) -> &str {
        &self.name
    }

    fn extra_problems(&self) -> Vec<String> {
        code_list_problems("course_codes", &self.course_codes)
    }
}

/// A payload of either kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityPayload {
    Course(CoursePayload),
    Degree(DegreePayload),
}

impl EntityPayload {
    /// Parse a stored or submitted JSON object as the payload of `kind`.
    pub fn from_json(kind: EntityKind, value: serde_json::Value) -> Result<Self, CoreError> {
        Ok(match kind {
            EntityKind::Course => EntityPayload::Course(parse_payload(value)?),
            EntityKind::Degree => EntityPayload::Degree(parse_payload(value)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Course(_) => EntityKind::Course,
            EntityPayload::Degree(_) => EntityKind::Degree,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EntityPayload::Course(p) => p.name(),
            EntityPayload::Degree(p) => p.name(),
        }
    }

    pub fn check_complete(&self) -> Result<(), CoreError> {
        match self {
            EntityPayload::Course(p) => p.check_complete(),
            EntityPayload::Degree(p) => p.check_complete(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize payload: {e}")))
    }
}

/// Parse a JSON object into a typed payload.
pub fn parse_payload<P: CurriculumPayload>(value: serde_json::Value) -> Result<P, CoreError> {
    if !value.is_object() {
        return Err(CoreError::Validation(format!(
            "{} payload must be a JSON object",
            P::KIND
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("Invalid {} payload: {e}", P::KIND)))
}

/// Apply a shallow merge patch to a stored payload.
///
/// Keys in `patch` replace the stored value; a `null` resets the field to its
/// default. The result must still parse as the payload of `kind`, and is
/// returned in normalised form.
pub fn merge_patch(
    kind: EntityKind,
    current: &serde_json::Value,
    patch: &serde_json::Map<String, serde_json::Value>,
) -> Result<serde_json::Value, CoreError> {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    EntityPayload::from_json(kind, serde_json::Value::Object(merged))?.to_json()
}

fn code_list_problems(field: &str, codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .filter(|code| validate_code(code).is_err())
        .map(|code| format!("{field} contains invalid code '{code}'"))
        .collect()
}

fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn complete_course() -> serde_json::Value {
        json!({
            "name": "Intro to Programming",
            "description": "First-year programming",
            "credits": 6,
            "curriculum": "<p>Week 1: variables</p>",
            "prerequisites": [],
            "learning_outcomes": ["Write small programs"]
        })
    }

    #[test]
    fn valid_codes_accepted() {
        for code in ["CS101", "MATH-2", "BSC_CS", "AB"] {
            assert!(validate_code(code).is_ok(), "{code} should be valid");
        }
    }

    #[test]
    fn invalid_codes_rejected() {
        for code in ["", "C", "cs101", "101CS", "CS 101", "ABCDEFGHIJKLMNOPQRSTUV"] {
            assert!(validate_code(code).is_err(), "{code} should be invalid");
        }
    }

    #[test]
    fn complete_course_passes() {
        let payload = EntityPayload::from_json(EntityKind::Course, complete_course()).unwrap();
        assert_eq!(payload.kind(), EntityKind::Course);
        assert_eq!(payload.name(), "Intro to Programming");
        assert!(payload.check_complete().is_ok());
    }

    #[test]
    fn empty_draft_parses_but_is_incomplete() {
        let payload = EntityPayload::from_json(EntityKind::Course, json!({})).unwrap();
        let err = payload.check_complete().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("credits must be between 1 and 60"), "{message}");
        assert!(message.contains("curriculum is required"), "{message}");
        assert!(message.contains("name is required"), "{message}");
    }

    #[test]
    fn blank_name_is_incomplete() {
        let mut value = complete_course();
        value["name"] = json!("   ");
        let payload = EntityPayload::from_json(EntityKind::Course, value).unwrap();
        assert_matches!(payload.check_complete(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = EntityPayload::from_json(EntityKind::Course, json!({ "status": "active" }));
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("status"));
    }

    #[test]
    fn non_object_payload_rejected() {
        assert!(EntityPayload::from_json(EntityKind::Degree, json!([1, 2])).is_err());
    }

    #[test]
    fn degree_requires_courses() {
        let payload = EntityPayload::from_json(
            EntityKind::Degree,
            json!({
                "name": "BSc Computer Science",
                "degree_type": "BSc",
                "duration_years": 3,
                "total_credits": 360,
                "course_codes": []
            }),
        )
        .unwrap();
        let err = payload.check_complete().unwrap_err();
        assert!(err.to_string().contains("course_codes"));
    }

    #[test]
    fn degree_rejects_malformed_course_codes() {
        let payload = EntityPayload::from_json(
            EntityKind::Degree,
            json!({
                "name": "BSc Computer Science",
                "degree_type": "BSc",
                "duration_years": 3,
                "total_credits": 360,
                "course_codes": ["CS101", "bad code"]
            }),
        )
        .unwrap();
        let err = payload.check_complete().unwrap_err();
        assert!(err.to_string().contains("'bad code'"));
    }

    #[test]
    fn merge_patch_replaces_and_resets_fields() {
        let patch = json!({ "credits": 12, "description": null });
        let merged = merge_patch(
            EntityKind::Course,
            &complete_course(),
            patch.as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(merged["credits"], 12);
        assert_eq!(merged["description"], "");
        assert_eq!(merged["name"], "Intro to Programming");
    }

    #[test]
    fn merge_patch_type_checks_result() {
        let patch = json!({ "credits": "twelve" });
        let result = merge_patch(EntityKind::Course, &complete_course(), patch.as_object().unwrap());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn kind_round_trips() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!(EntityKind::Degree.to_string(), "Degree");
    }
}
