//! The structured resume record shared by every pipeline stage.
//!
//! Model output is untrusted: every field deserializes leniently (nulls become
//! defaults, scalars are stringified, a bare string stands in for a one-item
//! list) so that downstream rendering never has to null-check.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Top-level keys a structuring response must contain at least one of.
const RECOGNIZED_KEYS: &[&str] = &[
    "personalInfo",
    "professionalSummary",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
];

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("object has none of the resume keys")]
    NoResumeKeys,

    #[error("invalid resume field: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResume {
    #[serde(default, deserialize_with = "lenient_struct")]
    pub personal_info: PersonalInfo,
    #[serde(default, deserialize_with = "lenient_string")]
    pub professional_summary: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub experience: Vec<Experience>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub skills: Skills,
    #[serde(default, deserialize_with = "lenient_list")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub website: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub linkedin: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub gpa: Option<String>,
}

/// Skill lists behave as sets; see [`StructuredResume::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skills {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub technical: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub soft: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub technologies: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub issuer: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
}

impl StructuredResume {
    /// Coerces a parsed model response into a resume.
    ///
    /// Rejects values that are not objects or that carry none of the resume
    /// keys (e.g. `{"error": "..."}`); everything else is coerced.
    pub fn from_model_output(value: Value) -> Result<Self, ShapeError> {
        let object = match &value {
            Value::Object(map) => map,
            other => return Err(ShapeError::NotAnObject(json_kind(other))),
        };
        if !RECOGNIZED_KEYS.iter().any(|k| object.contains_key(*k)) {
            return Err(ShapeError::NoResumeKeys);
        }
        let resume: StructuredResume =
            serde_json::from_value(value).map_err(|e| ShapeError::Invalid(e.to_string()))?;
        Ok(resume.normalized())
    }

    /// Removes case-insensitive duplicates from the skill sets, keeping the
    /// first spelling and the original order.
    pub fn normalized(mut self) -> Self {
        dedup_case_insensitive(&mut self.skills.technical);
        dedup_case_insensitive(&mut self.skills.soft);
        dedup_case_insensitive(&mut self.skills.languages);
        self
    }

    pub fn display_name(&self) -> Option<&str> {
        let name = self.personal_info.name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

fn dedup_case_insensitive(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.to_lowercase()));
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let s = value_to_string(&value);
    Ok(if s.is_empty() { None } else { Some(s) })
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        other => vec![value_to_string(&other)],
    };
    Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
}

/// Entries that are not objects are dropped; a lone object becomes a list of one.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_struct<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        obj @ Value::Object(_) => serde_json::from_value(obj).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}
