use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::models::{Job, RequirementMatch, RequirementStatus};

const KNOWN_TECHNOLOGIES: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "Kotlin", "Scala", "Go", "Golang",
    "Rust", "C++", "C#", "Ruby", "PHP", "Swift", "Elixir", "Haskell", "Clojure", "Perl",
    "React", "Angular", "Vue", "Svelte", "Next.js", "Node.js", "Express", "Django",
    "Flask", "FastAPI", "Spring", "Rails", ".NET", "GraphQL", "REST", "gRPC",
    "SQL", "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch", "Cassandra",
    "Kafka", "RabbitMQ", "Spark", "Hadoop", "Airflow", "Snowflake", "dbt",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "Ansible", "Linux",
    "Git", "CI/CD", "Jenkins", "HTML", "CSS", "Tailwind",
    "TensorFlow", "PyTorch", "Pandas", "NumPy", "Machine Learning", "LLM",
    "Microservices", "Agile", "Scrum",
];

/// Words that start the trailing clause of a requirement ("Rust experience", ...).
const CLAUSE_MARKERS: &[&str] = &["experience", "knowledge", "understanding", "proficiency", "skills"];

static TECHNOLOGY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut terms: Vec<&str> = KNOWN_TECHNOLOGIES.to_vec();
    // Longest first so "Node.js" is preferred over a shorter overlapping name.
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternatives: Vec<String> = terms.iter().map(|t| bounded(t)).collect();
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .expect("Invalid regex")
});

/// Word boundaries only where the term itself begins/ends with a word character,
/// so "C++" and ".NET" still match.
fn bounded(term: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = if term.starts_with(is_word) { r"\b" } else { "" };
    let end = if term.ends_with(is_word) { r"\b" } else { "" };
    format!("{}{}{}", start, regex::escape(term), end)
}

pub fn matched_skills(job: &Job) -> Vec<String> {
    job.requirements_match()
        .iter()
        .filter(|r| r.status == RequirementStatus::CanDoWell)
        .map(|r| skill_label(&r.requirement))
        .collect()
}

pub fn skill_label(requirement: &str) -> String {
    if let Some(m) = TECHNOLOGY_PATTERN.find(requirement) {
        return m.as_str().to_string();
    }

    let lower = requirement.to_lowercase();
    let cut = CLAUSE_MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min();
    if let Some(idx) = cut {
        // `to_lowercase` can change byte lengths; only trust idx on a boundary.
        if let Some(head) = requirement.get(..idx) {
            let head = head.trim();
            if !head.is_empty() {
                return head.to_string();
            }
        }
    }

    requirement
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RequirementPercentages {
    pub can_do_well: u32,
    pub can_transfer: u32,
    pub must_learn: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RequirementCounts {
    pub can_do_well: usize,
    pub can_transfer: usize,
    pub must_learn: usize,
    pub total: usize,
    pub percentages: RequirementPercentages,
}

pub fn requirement_counts(requirements: &[RequirementMatch]) -> RequirementCounts {
    let mut counts = RequirementCounts {
        total: requirements.len(),
        ..RequirementCounts::default()
    };

    for requirement in requirements {
        match requirement.status {
            RequirementStatus::CanDoWell => counts.can_do_well += 1,
            RequirementStatus::CanTransfer => counts.can_transfer += 1,
            RequirementStatus::MustLearn => counts.must_learn += 1,
            RequirementStatus::Other(_) => {}
        }
    }

    counts.percentages = RequirementPercentages {
        can_do_well: percentage(counts.can_do_well, counts.total),
        can_transfer: percentage(counts.can_transfer, counts.total),
        must_learn: percentage(counts.must_learn, counts.total),
    };
    counts
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}

/// Explicit `match_score`, else the CV match's overall percentage, else 0.
pub fn match_score(job: &Job) -> f64 {
    job.match_score
        .as_ref()
        .and_then(|score| score.value())
        .or_else(|| {
            job.cv_match
                .as_ref()
                .and_then(|cv| cv.overall_match_percentage.as_ref())
                .and_then(|score| score.value())
        })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirement(text: &str, status: &str) -> serde_json::Value {
        json!({"requirement": text, "status": status, "match_score": 50})
    }

    fn job_with(requirements: Vec<serde_json::Value>) -> Job {
        serde_json::from_value(json!({
            "id": "j1",
            "position": "Engineer",
            "company": "Acme",
            "last_updated": "2024-01-01T00:00:00.000Z",
            "cv_match": {"overall_match_percentage": 72, "requirements_match": requirements}
        }))
        .unwrap()
    }

    #[test]
    fn known_technology_is_extracted() {
        assert_eq!(skill_label("5+ years of professional Rust development"), "Rust");
        assert_eq!(skill_label("Hands-on kubernetes in production"), "kubernetes");
        assert_eq!(skill_label("Strong Node.js background"), "Node.js");
        assert_eq!(skill_label("Modern C++ (17/20)"), "C++");
    }

    #[test]
    fn technology_needs_word_boundaries() {
        // "Go" must not match inside "Good"; falls through to the clause rule.
        assert_eq!(skill_label("Good communication skills"), "Good communication");
        assert_eq!(skill_label("JavaScript tooling"), "JavaScript");
    }

    #[test]
    fn trailing_clause_is_stripped() {
        assert_eq!(skill_label("Distributed systems experience"), "Distributed systems");
        assert_eq!(skill_label("Deep understanding of networking"), "Deep");
    }

    #[test]
    fn falls_back_to_first_three_words() {
        assert_eq!(skill_label("Fluent German and English"), "Fluent German and");
        assert_eq!(skill_label("Experience leading teams"), "Experience leading teams");
        assert_eq!(skill_label("Mentoring"), "Mentoring");
    }

    #[test]
    fn matched_skills_only_include_can_do_well() {
        let job = job_with(vec![
            requirement("Python experience", "Can do well"),
            requirement("Kafka knowledge", "Must learn"),
            requirement("Team leadership skills", "Can do well"),
            requirement("Payments domain", "Can transfer"),
        ]);
        assert_eq!(matched_skills(&job), vec!["Python", "Team leadership"]);
    }

    #[test]
    fn counts_sum_to_total() {
        let job = job_with(vec![
            requirement("a", "Can do well"),
            requirement("b", "Can transfer"),
            requirement("c", "Must learn"),
        ]);
        let counts = requirement_counts(job.requirements_match());
        assert_eq!(counts.can_do_well + counts.can_transfer + counts.must_learn, counts.total);
        assert_eq!(counts.total, 3);
        let p = counts.percentages;
        assert_eq!((p.can_do_well, p.can_transfer, p.must_learn), (33, 33, 33));
        let sum = p.can_do_well + p.can_transfer + p.must_learn;
        assert!((98..=102).contains(&sum));
    }

    #[test]
    fn percentages_round_half_up() {
        let job = job_with(vec![
            requirement("a", "Can do well"),
            requirement("b", "Can do well"),
            requirement("c", "Can do well"),
            requirement("d", "Must learn"),
            requirement("e", "Must learn"),
            requirement("f", "Can transfer"),
            requirement("g", "Can transfer"),
            requirement("h", "Can transfer"),
        ]);
        let counts = requirement_counts(job.requirements_match());
        // 3/8 = 37.5 -> 38, 2/8 = 25
        assert_eq!(counts.percentages.can_do_well, 38);
        assert_eq!(counts.percentages.must_learn, 25);
    }

    #[test]
    fn empty_requirements_give_zero_percentages() {
        let counts = requirement_counts(&[]);
        assert_eq!(counts, RequirementCounts::default());
    }

    #[test]
    fn match_score_resolution_order() {
        let mut job = job_with(vec![]);
        assert_eq!(match_score(&job), 72.0);

        job.match_score = serde_json::from_value(json!(90)).unwrap();
        assert_eq!(match_score(&job), 90.0);

        job.match_score = None;
        job.cv_match = None;
        assert_eq!(match_score(&job), 0.0);
    }
}
