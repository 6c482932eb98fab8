use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::errors::ImportError;
use crate::models::{Job, Priority, Status, new_id, now_timestamp};

const REQUIRED_FIELDS: [&str; 2] = ["position", "company"];

#[derive(Debug, Default)]
pub struct LenientImport {
    pub jobs: Vec<Job>,
    pub skipped: Vec<ImportError>,
}

pub fn parse(text: &str) -> Result<Vec<Job>, ImportError> {
    let raw: Value = serde_json::from_str(text)?;
    normalize(raw)
}

pub fn parse_lenient(text: &str) -> Result<LenientImport, ImportError> {
    let raw: Value = serde_json::from_str(text)?;
    normalize_lenient(raw)
}

/// All-or-nothing: any invalid element rejects the whole batch, and every
/// invalid element is reported.
pub fn normalize(raw: Value) -> Result<Vec<Job>, ImportError> {
    let mut jobs = Vec::new();
    let mut errors = Vec::new();
    for (index, item) in elements(raw)?.into_iter().enumerate() {
        match normalize_item(index, item) {
            Ok(job) => jobs.push(job),
            Err(e) => errors.push(e),
        }
    }

    match errors.len() {
        0 => Ok(jobs),
        1 => Err(errors.remove(0)),
        _ => Err(ImportError::Rejected(errors)),
    }
}

pub fn normalize_lenient(raw: Value) -> Result<LenientImport, ImportError> {
    let mut outcome = LenientImport::default();
    for (index, item) in elements(raw)?.into_iter().enumerate() {
        match normalize_item(index, item) {
            Ok(job) => outcome.jobs.push(job),
            Err(e) => {
                tracing::warn!("Skipping invalid import item: {e}");
                outcome.skipped.push(e);
            }
        }
    }
    Ok(outcome)
}

fn elements(raw: Value) -> Result<Vec<Value>, ImportError> {
    match raw {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(ImportError::UnsupportedShape),
    }
}

fn normalize_item(index: usize, item: Value) -> Result<Job, ImportError> {
    let Value::Object(mut fields) = item else {
        return Err(ImportError::NotAnObject { index });
    };

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|name| !is_truthy(fields.get(*name)))
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingFields {
            index,
            fields: missing,
        });
    }

    fill_identity(&mut fields);
    fill_priority(&mut fields);
    fill_status(index, &mut fields)?;
    fill_last_updated(&mut fields);

    serde_json::from_value(Value::Object(fields))
        .map_err(|source| ImportError::Malformed { index, source })
}

fn fill_identity(fields: &mut Map<String, Value>) {
    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.is_empty() => return,
        Some(other) if is_truthy(Some(other)) => other.to_string(),
        _ => new_id(),
    };
    fields.insert("id".into(), Value::String(id));
}

fn fill_priority(fields: &mut Map<String, Value>) {
    let priority = match fields.get("priority_level") {
        Some(value) if is_truthy(Some(value)) => Priority::from_value(value),
        _ => Priority::default(),
    };
    fields.insert("priority_level".into(), Value::from(priority.level()));
}

/// Epoch milliseconds are converted. Other non-text values are left for
/// deserialization to reject.
fn fill_last_updated(fields: &mut Map<String, Value>) {
    let timestamp = match fields.get("last_updated") {
        Some(value) if !is_truthy(Some(value)) => now_timestamp(),
        None => now_timestamp(),
        Some(Value::Number(n)) => match n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => n.to_string(),
        },
        Some(_) => return,
    };
    fields.insert("last_updated".into(), Value::String(timestamp));
}

fn fill_status(index: usize, fields: &mut Map<String, Value>) -> Result<(), ImportError> {
    let status = match fields.get("status") {
        Some(value) if !is_truthy(Some(value)) => Status::default(),
        None => Status::default(),
        Some(Value::String(s)) => s.parse().map_err(|_| ImportError::InvalidStatus {
            index,
            value: s.clone(),
        })?,
        Some(other) => {
            return Err(ImportError::InvalidStatus {
                index,
                value: other.to_string(),
            });
        }
    };
    fields.insert("status".into(), Value::String(status.as_str().into()));
    Ok(())
}

/// JSON-document truthiness: null, false, 0 and "" are treated as not supplied.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_becomes_one_job_with_defaults() {
        let jobs = normalize(json!({"position": "SRE", "company": "Acme"})).unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(!job.id.is_empty());
        assert_eq!(job.priority_level, Priority::Low);
        assert_eq!(job.status, Status::New);
        assert!(crate::display::parse_timestamp(&job.last_updated).is_some());
        assert!(!job.hidden);
    }

    #[test]
    fn falsy_fields_are_replaced() {
        let jobs = normalize(json!([{
            "id": "", "position": "SRE", "company": "Acme",
            "priority_level": 0, "status": "", "last_updated": null
        }]))
        .unwrap();
        let job = &jobs[0];
        assert!(!job.id.is_empty());
        assert_eq!(job.priority_level, Priority::Low);
        assert_eq!(job.status, Status::New);
    }

    #[test]
    fn supplied_fields_are_kept_and_canonicalized() {
        let jobs = normalize(json!({
            "id": "keep-me", "position": "SRE", "company": "Acme",
            "priority_level": "1", "status": "interview",
            "last_updated": "2024-02-02T00:00:00.000Z"
        }))
        .unwrap();
        let job = &jobs[0];
        assert_eq!(job.id, "keep-me");
        assert_eq!(job.priority_level, Priority::High);
        assert_eq!(job.status, Status::Interview);
        assert_eq!(job.last_updated, "2024-02-02T00:00:00.000Z");
    }

    #[test]
    fn out_of_range_priority_defaults_to_low() {
        let jobs = normalize(json!({"position": "SRE", "company": "Acme", "priority_level": 9})).unwrap();
        assert_eq!(jobs[0].priority_level, Priority::Low);
    }

    #[test]
    fn generated_ids_are_unique() {
        let jobs = normalize(json!([
            {"position": "A", "company": "X"},
            {"position": "B", "company": "Y"}
        ]))
        .unwrap();
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[test]
    fn one_invalid_item_rejects_the_batch() {
        let err = normalize(json!([
            {"position": "A", "company": "X"},
            {"position": "", "job_description": "no company either"}
        ]))
        .unwrap_err();
        match err {
            ImportError::MissingFields { index, fields } => {
                assert_eq!(index, 1);
                assert_eq!(fields, vec!["position", "company"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_import_reports_every_invalid_item() {
        let err = normalize(json!([
            {"position": "A"},
            {"company": "Y"},
            {"position": "C", "company": "Z"}
        ]))
        .unwrap_err();
        let ImportError::Rejected(errors) = &err else {
            panic!("expected every item to be reported, got: {err}");
        };
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            ImportError::MissingFields { index: 0, fields } if fields == &vec!["company"]
        ));
        assert!(matches!(
            &errors[1],
            ImportError::MissingFields { index: 1, fields } if fields == &vec!["position"]
        ));
    }

    #[test]
    fn epoch_millis_last_updated_is_converted() {
        let jobs = normalize(json!({
            "position": "SRE", "company": "Acme", "last_updated": 1700000000000_i64
        }))
        .unwrap();
        assert_eq!(jobs[0].last_updated, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn non_text_last_updated_is_malformed() {
        let err = normalize(json!({"position": "SRE", "company": "Acme", "last_updated": true}))
            .unwrap_err();
        assert!(matches!(err, ImportError::Malformed { index: 0, .. }));
    }

    #[test]
    fn whole_number_float_priority_is_read() {
        let jobs = normalize(json!({"position": "SRE", "company": "Acme", "priority_level": 2.0})).unwrap();
        assert_eq!(jobs[0].priority_level, Priority::Medium);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = normalize(json!({"position": "A", "company": "X", "status": "Ghosted"})).unwrap_err();
        assert!(matches!(err, ImportError::InvalidStatus { index: 0, .. }));
    }

    #[test]
    fn non_object_inputs_are_rejected() {
        assert!(matches!(normalize(json!("job")), Err(ImportError::UnsupportedShape)));
        assert!(matches!(
            normalize(json!([{"position": "A", "company": "X"}, 3])),
            Err(ImportError::NotAnObject { index: 1 })
        ));
    }

    #[test]
    fn invalid_json_text_is_reported() {
        assert!(matches!(parse("{ not json"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn lenient_import_keeps_valid_items() {
        let outcome = normalize_lenient(json!([
            {"position": "A", "company": "X"},
            {"company": "Y"},
            {"position": "C", "company": "Z"}
        ]))
        .unwrap();
        assert_eq!(outcome.jobs.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize(json!([{
            "position": "SRE", "company": "Acme", "tech_stack": "Rust, Go",
            "hours_per_week": 40, "cv_match": {"overall_match_percentage": 77},
            "salary_from_external_sources": "$100K-$120K", "referral": "Sam"
        }]))
        .unwrap();
        let text = serde_json::to_string(&first).unwrap();
        let second = parse(&text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn export_then_import_preserves_identity_fields() {
        let original = normalize(json!([
            {"position": "A", "company": "X", "status": "Offer", "priority_level": 1,
             "interview_notes": "went well", "hidden": true},
            {"position": "B", "company": "Y"}
        ]))
        .unwrap();
        let exported = crate::export::to_json(&original).unwrap();
        let reimported = parse(&exported).unwrap();
        for (a, b) in original.iter().zip(&reimported) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.position, b.position);
            assert_eq!(a.company, b.company);
            assert_eq!(a.status, b.status);
            assert_eq!(a.priority_level, b.priority_level);
        }
        assert_eq!(original, reimported);
    }
}
