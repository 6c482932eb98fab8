use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;

use crate::display::format_score;
use crate::matching::match_score;
use crate::models::Job;
use crate::salary::{SalarySource, resolve_job_salary};

const CSV_HEADER: [&str; 14] = [
    "Position",
    "Project",
    "Company",
    "Industry",
    "Location",
    "Status",
    "Priority",
    "Tech Stack",
    "Remote Policy",
    "Salary",
    "Start Date",
    "Match Score",
    "Last Updated",
    "URL",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "job-applications-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn render(jobs: &[Job], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(jobs),
        ExportFormat::Csv => Ok(to_csv(jobs)),
    }
}

pub fn to_json(jobs: &[Job]) -> Result<String> {
    serde_json::to_string_pretty(jobs).context("Failed to serialize jobs")
}

pub fn to_csv(jobs: &[Job]) -> String {
    let mut lines = Vec::with_capacity(jobs.len() + 1);
    lines.push(csv_row(CSV_HEADER.iter().map(|h| h.to_string())));
    for job in jobs {
        lines.push(csv_row(csv_fields(job)));
    }
    lines.join("\n")
}

fn csv_fields(job: &Job) -> [String; 14] {
    let salary = resolve_job_salary(job);
    let salary = if salary.source == SalarySource::None {
        String::new()
    } else {
        salary.value
    };
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    [
        job.position.clone(),
        text(&job.project),
        job.company.clone(),
        text(&job.industry),
        text(&job.location),
        job.status.to_string(),
        job.priority_level.label().to_string(),
        job.tech_stack_joined(),
        text(&job.remote_policy),
        salary,
        text(&job.start_date),
        format_score(match_score(job)),
        job.last_updated.clone(),
        text(&job.url),
    ]
}

fn csv_row(fields: impl IntoIterator<Item = String>) -> String {
    fields
        .into_iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
