use std::cmp::Ordering;
use std::str::FromStr;

use deunicode::deunicode;

use crate::display::{parse_date, parse_timestamp};
use crate::errors::ParseError;
use crate::matching::match_score;
use crate::models::{Job, Numeric};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Position,
    Company,
    Location,
    Status,
    PriorityLevel,
    TechStack,
    Project,
    Industry,
    RemotePolicy,
    PossibleSalary,
    StartDate,
    MatchScore,
    LastUpdated,
    HoursPerWeek,
    VacationDays,
}

impl SortField {
    pub const ALL: [SortField; 15] = [
        SortField::Position,
        SortField::Company,
        SortField::Location,
        SortField::Status,
        SortField::PriorityLevel,
        SortField::TechStack,
        SortField::Project,
        SortField::Industry,
        SortField::RemotePolicy,
        SortField::PossibleSalary,
        SortField::StartDate,
        SortField::MatchScore,
        SortField::LastUpdated,
        SortField::HoursPerWeek,
        SortField::VacationDays,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Position => "position",
            SortField::Company => "company",
            SortField::Location => "location",
            SortField::Status => "status",
            SortField::PriorityLevel => "priority_level",
            SortField::TechStack => "tech_stack",
            SortField::Project => "project",
            SortField::Industry => "industry",
            SortField::RemotePolicy => "remote_policy",
            SortField::PossibleSalary => "possible_salary",
            SortField::StartDate => "start_date",
            SortField::MatchScore => "match_score",
            SortField::LastUpdated => "last_updated",
            SortField::HoursPerWeek => "hours_per_week",
            SortField::VacationDays => "vacation_days",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for SortField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        let wanted = match wanted.as_str() {
            "priority" => "priority_level",
            "salary" => "possible_salary",
            other => other,
        };
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| ParseError::new("sort field", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// `field: None` is an unrecognized field: the input order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: Some(SortField::LastUpdated),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    pub fn from_name(field: &str, direction: SortDirection) -> Self {
        match field.parse::<SortField>() {
            Ok(field) => Self::new(field, direction),
            Err(e) => {
                tracing::warn!("{e}; leaving jobs unsorted");
                Self {
                    field: None,
                    direction,
                }
            }
        }
    }
}

/// A sorted copy of `jobs`. Ties break on `id`, so the two directions are exact
/// reverses of each other.
pub fn apply_sort(jobs: &[Job], sort: &SortSpec) -> Vec<Job> {
    let mut sorted = jobs.to_vec();
    let Some(field) = sort.field else {
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let ord = compare_by(field, a, b).then_with(|| a.id.cmp(&b.id));
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

pub fn compare_by(field: SortField, a: &Job, b: &Job) -> Ordering {
    match field {
        SortField::Position => compare_text(&a.position, &b.position),
        SortField::Company => compare_text(&a.company, &b.company),
        SortField::Location => compare_opt_text(&a.location, &b.location),
        SortField::Status => compare_text(a.status.as_str(), b.status.as_str()),
        SortField::PriorityLevel => a.priority_level.cmp(&b.priority_level),
        SortField::TechStack => compare_text(&a.tech_stack_joined(), &b.tech_stack_joined()),
        SortField::Project => compare_opt_text(&a.project, &b.project),
        SortField::Industry => compare_opt_text(&a.industry, &b.industry),
        SortField::RemotePolicy => compare_opt_text(&a.remote_policy, &b.remote_policy),
        SortField::PossibleSalary => compare_opt_text(&a.possible_salary, &b.possible_salary),
        SortField::StartDate => compare_start_dates(a, b),
        SortField::MatchScore => match_score(a).total_cmp(&match_score(b)),
        SortField::LastUpdated => compare_timestamps(&a.last_updated, &b.last_updated),
        SortField::HoursPerWeek => compare_numeric(&a.hours_per_week, &b.hours_per_week),
        SortField::VacationDays => compare_numeric(&a.vacation_days, &b.vacation_days),
    }
}

fn collation_key(s: &str) -> String {
    deunicode(s).to_lowercase()
}

fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn compare_opt_text(a: &Option<String>, b: &Option<String>) -> Ordering {
    compare_text(a.as_deref().unwrap_or(""), b.as_deref().unwrap_or(""))
}

fn compare_numeric(a: &Option<Numeric>, b: &Option<Numeric>) -> Ordering {
    let value = |n: &Option<Numeric>| n.as_ref().and_then(Numeric::value).unwrap_or(0.0);
    value(a).total_cmp(&value(b))
}

/// Dated jobs before undated ones.
fn compare_start_dates(a: &Job, b: &Job) -> Ordering {
    let date = |job: &Job| job.start_date.as_deref().and_then(parse_date);
    match (date(a), date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_timestamps(a: &str, b: &str) -> Ordering {
    parse_timestamp(a)
        .cmp(&parse_timestamp(b))
        .then_with(|| a.cmp(b))
}
