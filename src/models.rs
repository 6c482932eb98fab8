use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ParseError;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    New,
    Applied,
    Interview,
    Rejected,
    Offer,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::New,
        Status::Applied,
        Status::Interview,
        Status::Rejected,
        Status::Offer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::New => "New",
            Status::Applied => "Applied",
            Status::Interview => "Interview",
            Status::Rejected => "Rejected",
            Status::Offer => "Offer",
        }
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseError::new("status", s))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    High = 1,
    Medium = 2,
    #[default]
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }

    /// Reads whatever an imported document put in `priority_level`.
    /// Anything unrecognized is Low.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .and_then(Self::from_level),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if let Ok(level) = wanted.parse::<i64>() {
            return Self::from_level(level).ok_or_else(|| ParseError::new("priority", s));
        }
        Priority::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseError::new("priority", s))
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Priority::from_value(&value))
    }
}

/// A number that imported documents sometimes write as text ("40 hours", "85%").
/// Keeps the original JSON representation so re-serialization is verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => n.as_f64(),
            Numeric::Text(text) => LEADING_NUMBER
                .find(text)
                .and_then(|m| m.as_str().parse().ok()),
        }
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Numeric::Number(n) => write!(f, "{}", n),
            Numeric::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequirementStatus {
    CanDoWell,
    CanTransfer,
    MustLearn,
    /// Anything else an analysis produced; kept verbatim, counted in no bucket.
    Other(String),
}

impl RequirementStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RequirementStatus::CanDoWell => "Can do well",
            RequirementStatus::CanTransfer => "Can transfer",
            RequirementStatus::MustLearn => "Must learn",
            RequirementStatus::Other(s) => s,
        }
    }
}

impl From<String> for RequirementStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "can do well" => RequirementStatus::CanDoWell,
            "can transfer" => RequirementStatus::CanTransfer,
            "must learn" => RequirementStatus::MustLearn,
            _ => RequirementStatus::Other(s),
        }
    }
}

impl From<RequirementStatus> for String {
    fn from(status: RequirementStatus) -> Self {
        match status {
            RequirementStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementMatch {
    #[serde(default)]
    pub requirement: String,
    pub status: RequirementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transferable_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<Numeric>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Numeric>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CvMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_match_percentage: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_match: Option<Vec<RequirementMatch>>,
    /// Older analyses wrote the same list under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements_assessment: Option<Vec<RequirementMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_match: Option<SubScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority_match: Option<SubScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_match: Option<SubScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_match: Option<SubScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation_match: Option<SubScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_match: Option<SubScore>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CvMatch {
    /// The current requirement list, or the legacy one when the current field is absent.
    pub fn requirements(&self) -> &[RequirementMatch] {
        self.requirements_match
            .as_deref()
            .or(self.requirements_assessment.as_deref())
            .unwrap_or(&[])
    }

    pub fn sub_scores(&self) -> [(&'static str, Option<&SubScore>); 6] {
        [
            ("Experience", self.experience_match.as_ref()),
            ("Seniority", self.seniority_match.as_ref()),
            ("Industry", self.industry_match.as_ref()),
            ("Project", self.project_match.as_ref()),
            ("Compensation", self.compensation_match.as_ref()),
            ("Location", self.location_match.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecruiterContact {
    Freeform(String),
    Structured(ContactDetails),
}

impl std::fmt::Display for RecruiterContact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecruiterContact::Freeform(text) => f.write_str(text),
            RecruiterContact::Structured(details) => {
                let parts: Vec<&str> = [
                    &details.name,
                    &details.email,
                    &details.phone,
                    &details.linkedin,
                ]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .collect();
                f.write_str(&parts.join(" | "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirements {
    Text(String),
    List(Vec<String>),
}

impl Requirements {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Requirements::Text(text) => text.lines().collect(),
            Requirements::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub position: String,
    pub company: String,
    #[serde(default)]
    pub priority_level: Priority,
    #[serde(default)]
    pub status: Status,
    pub last_updated: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,
    #[serde(default, deserialize_with = "deserialize_tech_stack")]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter_contact: Option<RecruiterContact>,

    #[serde(
        default,
        deserialize_with = "deserialize_loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub possible_salary: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary_from_external_sources: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary_estimate_from_context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacation_days: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_products: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_reputation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_match: Option<CvMatch>,

    /// Fields this model does not know about, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn touch(&mut self) {
        self.last_updated = now_timestamp();
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.touch();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority_level = priority;
        self.touch();
    }

    pub fn toggle_hidden(&mut self) {
        self.hidden = !self.hidden;
        self.touch();
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.interview_notes = notes.filter(|n| !n.trim().is_empty());
        self.touch();
    }

    pub fn set_cover_letter(&mut self, letter: Option<String>) {
        self.cover_letter = letter.filter(|l| !l.trim().is_empty());
        self.touch();
    }

    pub fn tech_stack_joined(&self) -> String {
        self.tech_stack.join(", ")
    }

    pub fn requirements_match(&self) -> &[RequirementMatch] {
        self.cv_match
            .as_ref()
            .map(CvMatch::requirements)
            .unwrap_or(&[])
    }
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn deserialize_tech_stack<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.trim().to_string()),
                other => Some(other.to_string()),
            })
            .filter(|item| !item.is_empty())
            .collect(),
        Some(other) => vec![other.to_string()],
    };
    Ok(items)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Accepts text, or a bare number/bool written where text was expected.
fn deserialize_loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
