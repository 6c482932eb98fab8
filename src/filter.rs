use crate::models::{Job, Priority, Status};

/// Which jobs the current view shows. `None` means "All" for status and priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub search: String,
    pub hide_hidden: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: String::new(),
            hide_hidden: true,
        }
    }
}

impl FilterSpec {
    /// Every active predicate must hold.
    pub fn matches(&self, job: &Job) -> bool {
        if self.hide_hidden && job.hidden {
            return false;
        }
        if self.status.is_some_and(|status| job.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| job.priority_level != priority) {
            return false;
        }
        self.matches_search(job)
    }

    fn matches_search(&self, job: &Job) -> bool {
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        job.position.to_lowercase().contains(&term)
            || job.company.to_lowercase().contains(&term)
            || job
                .location
                .as_deref()
                .is_some_and(|location| location.to_lowercase().contains(&term))
    }
}

/// Order-preserving subsequence of `jobs` that passes `filters`.
pub fn apply_filters(jobs: &[Job], filters: &FilterSpec) -> Vec<Job> {
    jobs.iter()
        .filter(|job| filters.matches(job))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(id: &str, position: &str, company: &str, status: &str, priority: u8) -> Job {
        serde_json::from_value(json!({
            "id": id,
            "position": position,
            "company": company,
            "status": status,
            "priority_level": priority,
            "last_updated": "2024-01-01T00:00:00.000Z"
        }))
        .unwrap()
    }

    fn fixture() -> Vec<Job> {
        let mut remote = job("3", "Platform Engineer", "Globex", "Applied", 1);
        remote.location = Some("Remote, Berlin".into());
        vec![
            job("1", "Rust Developer", "Acme", "Applied", 2),
            job("2", "Data Scientist", "Initech", "Interview", 1),
            remote,
            job("4", "Rust Consultant", "Hooli", "Rejected", 3),
        ]
    }

    fn ids(jobs: &[Job]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn default_filters_keep_everything_visible() {
        let jobs = fixture();
        assert_eq!(ids(&apply_filters(&jobs, &FilterSpec::default())), ["1", "2", "3", "4"]);
    }

    #[test]
    fn status_and_priority_filters() {
        let jobs = fixture();
        let filters = FilterSpec {
            status: Some(Status::Applied),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&apply_filters(&jobs, &filters)), ["1", "3"]);

        let filters = FilterSpec {
            priority: Some(Priority::High),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&apply_filters(&jobs, &filters)), ["2", "3"]);
    }

    #[test]
    fn search_covers_position_company_and_location() {
        let jobs = fixture();
        let search = |term: &str| FilterSpec {
            search: term.into(),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&apply_filters(&jobs, &search("rust"))), ["1", "4"]);
        assert_eq!(ids(&apply_filters(&jobs, &search("INITECH"))), ["2"]);
        assert_eq!(ids(&apply_filters(&jobs, &search("  berlin "))), ["3"]);
        assert!(apply_filters(&jobs, &search("cobol")).is_empty());
    }

    #[test]
    fn search_is_anded_with_status() {
        let jobs = fixture();
        let filters = FilterSpec {
            status: Some(Status::Applied),
            search: "rust".into(),
            ..FilterSpec::default()
        };
        // "Rust Consultant" matches the search but is Rejected.
        assert_eq!(ids(&apply_filters(&jobs, &filters)), ["1"]);
    }

    #[test]
    fn hidden_jobs_excluded_regardless_of_other_matches() {
        let mut jobs = vec![job("1", "Engineer", "Acme", "Applied", 2)];
        let applied = FilterSpec {
            status: Some(Status::Applied),
            ..FilterSpec::default()
        };
        assert_eq!(apply_filters(&jobs, &applied).len(), 1);

        let rejected = FilterSpec {
            status: Some(Status::Rejected),
            ..FilterSpec::default()
        };
        assert!(apply_filters(&jobs, &rejected).is_empty());

        jobs[0].toggle_hidden();
        assert!(apply_filters(&jobs, &applied).is_empty());

        let show_hidden = FilterSpec {
            hide_hidden: false,
            ..applied
        };
        assert_eq!(apply_filters(&jobs, &show_hidden).len(), 1);
    }

    #[test]
    fn result_preserves_relative_order() {
        let jobs = fixture();
        let filters = FilterSpec {
            search: "e".into(),
            ..FilterSpec::default()
        };
        let kept = apply_filters(&jobs, &filters);
        let positions: Vec<usize> = kept
            .iter()
            .map(|k| jobs.iter().position(|j| j.id == k.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
