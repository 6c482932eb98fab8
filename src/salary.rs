use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::Job;

/// `<symbol><digits>[K] <dash> <symbol><digits>[K]`, hyphen or en dash.
static CURRENCY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([$€£¥]\d+[kK]?)\s*[-–]\s*([$€£¥]\d+[kK]?)").expect("Invalid regex")
});

const EXTERNAL_DISPLAY_LIMIT: usize = 60;

pub const NO_SALARY_VALUE: &str = "Not specified";
const NO_SALARY_TOOLTIP: &str = "No salary information available";
const DIRECT_TOOLTIP: &str = "Salary mentioned in job posting";
const ESTIMATE_TOOLTIP: &str = "Estimated salary based on job context";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SalarySource {
    Direct,
    External,
    Estimate,
    None,
}

impl SalarySource {
    pub fn tag(self) -> &'static str {
        match self {
            SalarySource::Direct => "direct",
            SalarySource::External => "external",
            SalarySource::Estimate => "estimate",
            SalarySource::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSalary {
    pub value: String,
    pub source: SalarySource,
    pub tooltip: String,
}

pub fn resolve_salary(
    direct: Option<&str>,
    external: Option<&str>,
    estimated: Option<&str>,
) -> ResolvedSalary {
    if let Some(direct) = present(direct) {
        return ResolvedSalary {
            value: direct.to_string(),
            source: SalarySource::Direct,
            tooltip: DIRECT_TOOLTIP.to_string(),
        };
    }

    if let Some(external) = present(external) {
        return ResolvedSalary {
            value: summarize_external(external),
            source: SalarySource::External,
            tooltip: external.to_string(),
        };
    }

    if let Some(estimated) = present(estimated) {
        return ResolvedSalary {
            value: estimated.to_string(),
            source: SalarySource::Estimate,
            tooltip: ESTIMATE_TOOLTIP.to_string(),
        };
    }

    ResolvedSalary {
        value: NO_SALARY_VALUE.to_string(),
        source: SalarySource::None,
        tooltip: NO_SALARY_TOOLTIP.to_string(),
    }
}

pub fn resolve_job_salary(job: &Job) -> ResolvedSalary {
    resolve_salary(
        job.possible_salary.as_deref(),
        job.salary_from_external_sources.as_deref(),
        job.salary_estimate_from_context.as_deref(),
    )
}

fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.trim().is_empty())
}

fn summarize_external(text: &str) -> String {
    if let Some(caps) = CURRENCY_RANGE.captures(text) {
        return format!("{}-{}", &caps[1], &caps[2]);
    }

    if text.chars().count() > EXTERNAL_DISPLAY_LIMIT {
        let head: String = text.chars().take(EXTERNAL_DISPLAY_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_wins_over_everything() {
        let r = resolve_salary(Some("$120k"), Some("$100K-$130K"), Some("~$110k"));
        assert_eq!(r.source, SalarySource::Direct);
        assert_eq!(r.value, "$120k");
        assert_eq!(r.tooltip, "Salary mentioned in job posting");
    }

    #[test]
    fn single_present_field_selects_its_source() {
        assert_eq!(
            resolve_salary(Some("x"), None, None).source,
            SalarySource::Direct
        );
        assert_eq!(
            resolve_salary(None, Some("x"), None).source,
            SalarySource::External
        );
        assert_eq!(
            resolve_salary(None, None, Some("x")).source,
            SalarySource::Estimate
        );
    }

    #[test]
    fn whitespace_only_fields_count_as_absent() {
        let r = resolve_salary(Some("   "), Some(""), Some("\t"));
        assert_eq!(r.source, SalarySource::None);
        assert_eq!(r.value, NO_SALARY_VALUE);

        let r = resolve_salary(Some(" "), None, Some("€70k"));
        assert_eq!(r.source, SalarySource::Estimate);
        assert_eq!(r.tooltip, "Estimated salary based on job context");
    }

    #[test]
    fn external_range_is_extracted() {
        let text = "Glassdoor reports €260K–€281K for this role in Berlin";
        let r = resolve_salary(None, Some(text), None);
        assert_eq!(r.source, SalarySource::External);
        assert_eq!(r.value, "€260K-€281K");
        assert_eq!(r.tooltip, text);
    }

    #[test]
    fn external_range_with_spaced_hyphen() {
        let r = resolve_salary(None, Some("Levels.fyi: $150K - $185K base"), None);
        assert_eq!(r.value, "$150K-$185K");
    }

    #[test]
    fn separated_figures_are_not_a_range() {
        let text = "Levels.fyi: $150,000 - $185,000 base";
        let r = resolve_salary(None, Some(text), None);
        assert_eq!(r.source, SalarySource::External);
        assert_eq!(r.value, text);

        let r = resolve_salary(None, Some("Range $120.5K-$140K per year"), None);
        assert_eq!(r.value, "Range $120.5K-$140K per year");
    }

    #[test]
    fn long_external_text_without_range_is_truncated() {
        let text = "Comparable roles at similar companies in the region tend to pay well above the median";
        let r = resolve_salary(None, Some(text), None);
        assert_eq!(r.value.chars().count(), 63);
        assert!(r.value.ends_with("..."));
        assert_eq!(r.tooltip, text);
    }

    #[test]
    fn short_external_text_is_verbatim() {
        let r = resolve_salary(None, Some("Above market rate"), None);
        assert_eq!(r.value, "Above market rate");
    }

    #[test]
    fn truncation_is_char_safe() {
        let text = "€".repeat(80);
        let r = resolve_salary(None, Some(&text), None);
        assert_eq!(r.value, format!("{}...", "€".repeat(60)));
    }
}
