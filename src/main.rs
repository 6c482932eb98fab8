mod config;
mod db;
mod display;
mod errors;
mod export;
mod filter;
mod import;
mod matching;
mod models;
mod salary;
mod sort;
mod tui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::Database;
use display::{format_date, format_score, format_timestamp, truncate};
use export::ExportFormat;
use filter::{FilterSpec, apply_filters};
use matching::{match_score, matched_skills, requirement_counts};
use models::{Job, Priority, Status};
use salary::resolve_job_salary;
use sort::{SortDirection, SortSpec, apply_sort};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Job application tracker - import, filter, sort and score applications")]
struct Cli {
    /// Database file (overrides JOBTRACK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Add a job by hand
    Add {
        #[arg(long)]
        position: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        location: Option<String>,

        /// New, Applied, Interview, Rejected or Offer
        #[arg(short, long)]
        status: Option<Status>,

        /// 1 (High), 2 (Medium) or 3 (Low)
        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(long)]
        url: Option<String>,

        /// Comma-separated tech stack
        #[arg(long)]
        tech: Option<String>,
    },

    /// Import jobs from a JSON file (one object or an array); reads stdin without FILE
    Import {
        file: Option<PathBuf>,

        /// Skip invalid entries instead of rejecting the whole file
        #[arg(long)]
        lenient: bool,
    },

    /// List jobs
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show job details
    Show {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Set application status
    Status { id: String, status: Status },

    /// Set priority (1 = High, 2 = Medium, 3 = Low)
    Priority { id: String, priority: Priority },

    /// Toggle whether a job is hidden from default views
    Hide { id: String },

    /// Set interview notes; omit TEXT to clear them
    Note { id: String, text: Option<String> },

    /// Attach a cover letter from a text file
    CoverLetter { id: String, file: PathBuf },

    /// Replace a job with the contents of a JSON file (the id is kept)
    Edit { id: String, file: PathBuf },

    /// Delete a job
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Export all jobs
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output path (default: job-applications-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive table/detail view
    Browse {
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// Filter by status (New, Applied, Interview, Rejected, Offer or All)
    #[arg(short, long, default_value = "All")]
    status: String,

    /// Filter by priority (1, 2, 3 or All)
    #[arg(short, long, default_value = "All")]
    priority: String,

    /// Search position, company and location
    #[arg(short = 'q', long, default_value = "")]
    search: String,

    /// Include hidden jobs
    #[arg(long)]
    show_hidden: bool,

    /// Sort field (position, company, match_score, start_date, last_updated, ...)
    #[arg(long, default_value = "last_updated")]
    sort: String,

    /// Sort ascending
    #[arg(long, conflicts_with = "desc")]
    asc: bool,

    /// Sort descending (default)
    #[arg(long)]
    desc: bool,
}

impl ViewArgs {
    fn filters(&self) -> Result<FilterSpec> {
        let status = match self.status.as_str() {
            s if s.eq_ignore_ascii_case("all") => None,
            s => Some(s.parse::<Status>()?),
        };
        let priority = match self.priority.as_str() {
            p if p.eq_ignore_ascii_case("all") => None,
            p => Some(p.parse::<Priority>()?),
        };
        Ok(FilterSpec {
            status,
            priority,
            search: self.search.clone(),
            hide_hidden: !self.show_hidden,
        })
    }

    fn sort(&self) -> SortSpec {
        let direction = if self.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        SortSpec::from_name(&self.sort, direction)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = Database::open(config.resolve_db_path(cli.db))?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Add {
            position,
            company,
            location,
            status,
            priority,
            url,
            tech,
        } => {
            db.ensure_initialized()?;
            let mut fields = Map::new();
            fields.insert("position".into(), json!(position));
            fields.insert("company".into(), json!(company));
            if let Some(location) = location {
                fields.insert("location".into(), json!(location));
            }
            if let Some(status) = status {
                fields.insert("status".into(), json!(status.as_str()));
            }
            if let Some(priority) = priority {
                fields.insert("priority_level".into(), json!(priority.level()));
            }
            if let Some(url) = url {
                fields.insert("url".into(), json!(url));
            }
            if let Some(tech) = tech {
                fields.insert("tech_stack".into(), json!(tech));
            }

            let jobs = import::normalize(Value::Object(fields))?;
            let id = jobs[0].id.clone();
            db.add_jobs(jobs)?;
            println!("Added job {}", id);
        }

        Commands::Import { file, lenient } => {
            db.ensure_initialized()?;
            let text = read_input(file.as_deref())?;
            let jobs = if lenient {
                let outcome = import::parse_lenient(&text)?;
                for skipped in &outcome.skipped {
                    eprintln!("Skipped: {}", skipped);
                }
                outcome.jobs
            } else {
                import::parse(&text).context("Import rejected; nothing was saved")?
            };

            if jobs.is_empty() {
                println!("Nothing to import.");
            } else {
                let summary = db.add_jobs(jobs)?;
                println!(
                    "Imported {} new job(s), updated {} existing.",
                    summary.added, summary.updated
                );
            }
        }

        Commands::List { view } => {
            db.ensure_initialized()?;
            let jobs = db.load_jobs();
            let visible = apply_sort(&apply_filters(&jobs, &view.filters()?), &view.sort());
            print_table(&visible);
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            let job = db.get_job(&id)?;
            print_detail(&job);
        }

        Commands::Status { id, status } => {
            db.ensure_initialized()?;
            let job = db.update_job_status(&id, status)?;
            println!("{} at {} is now {}.", job.position, job.company, job.status);
        }

        Commands::Priority { id, priority } => {
            db.ensure_initialized()?;
            let job = db.update_job_priority(&id, priority)?;
            println!(
                "{} at {} is now {} priority.",
                job.position,
                job.company,
                job.priority_level.label()
            );
        }

        Commands::Hide { id } => {
            db.ensure_initialized()?;
            let job = db.toggle_hidden(&id)?;
            let state = if job.hidden { "hidden" } else { "visible" };
            println!("{} at {} is now {}.", job.position, job.company, state);
        }

        Commands::Note { id, text } => {
            db.ensure_initialized()?;
            let job = db.update_notes(&id, text)?;
            match job.interview_notes {
                Some(_) => println!("Saved notes for {}.", job.position),
                None => println!("Cleared notes for {}.", job.position),
            }
        }

        Commands::CoverLetter { id, file } => {
            db.ensure_initialized()?;
            let letter = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read cover letter: {}", file.display()))?;
            let job = db.update_cover_letter(&id, Some(letter))?;
            println!("Saved cover letter for {}.", job.position);
        }

        Commands::Edit { id, file } => {
            db.ensure_initialized()?;
            let text = read_input(Some(&file))?;
            let mut jobs = import::parse(&text).context("Edit rejected; nothing was saved")?;
            if jobs.len() != 1 {
                anyhow::bail!("Edit expects exactly one job object, got {}", jobs.len());
            }
            let job = db.replace_job(&id, jobs.remove(0))?;
            println!("Updated job {}.", job.id);
        }

        Commands::Delete { id, yes } => {
            db.ensure_initialized()?;
            let job = db.get_job(&id)?;
            if !yes && !confirm(&format!("Delete '{}' at {}?", job.position, job.company))? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = db.delete_job(&job.id)?;
            println!("Deleted {} at {}.", removed.position, removed.company);
        }

        Commands::Export { format, output } => {
            db.ensure_initialized()?;
            let jobs = db.load_jobs();
            let path = output.unwrap_or_else(|| {
                PathBuf::from(export::default_file_name(
                    format,
                    chrono::Local::now().date_naive(),
                ))
            });
            let body = export::render(&jobs, format)?;
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported {} job(s) to {}", jobs.len(), path.display());
        }

        Commands::Browse { view } => {
            db.ensure_initialized()?;
            tui::run_browse(&db, view.filters()?, view.sort())?;
        }
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_table(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs found.");
        return;
    }

    println!(
        "{:<8} {:<10} {:<6} {:<28} {:<18} {:<20} {:>5} {:<16}",
        "ID", "STATUS", "PRI", "POSITION", "COMPANY", "SALARY", "MATCH", "UPDATED"
    );
    println!("{}", "-".repeat(118));
    for job in jobs {
        let hidden = if job.hidden { "~" } else { "" };
        println!(
            "{:<8} {:<10} {:<6} {:<28} {:<18} {:<20} {:>5} {:<16}",
            truncate(&job.id, 8),
            format!("{}{}", job.status, hidden),
            job.priority_level.label(),
            truncate(&job.position, 28),
            truncate(&job.company, 18),
            truncate(&resolve_job_salary(job).value, 20),
            format_score(match_score(job)),
            format_timestamp(&job.last_updated)
        );
    }
}

fn print_detail(job: &Job) {
    println!("{} at {}", job.position, job.company);
    println!("ID: {}", job.id);
    println!("Status: {}", job.status);
    println!("Priority: {}", job.priority_level.label());
    if job.hidden {
        println!("Hidden: yes");
    }
    if let Some(location) = &job.location {
        println!("Location: {}", location);
    }
    if let Some(remote) = &job.remote_policy {
        println!("Remote: {}", remote);
    }
    if let Some(project) = &job.project {
        println!("Project: {}", project);
    }
    if let Some(industry) = &job.industry {
        println!("Industry: {}", industry);
    }

    let salary = resolve_job_salary(job);
    println!("Salary: {} ({})", salary.value, salary.source.tag());
    println!("  {}", salary.tooltip);

    if !job.tech_stack.is_empty() {
        println!("Tech stack: {}", job.tech_stack_joined());
    }
    if let Some(start) = &job.start_date {
        println!("Start date: {}", format_date(start));
    }
    if let Some(deadline) = &job.application_deadline {
        println!("Deadline: {}", format_date(deadline));
    }
    if let Some(hours) = &job.hours_per_week {
        println!("Hours/week: {}", hours);
    }
    if let Some(days) = &job.vacation_days {
        println!("Vacation days: {}", days);
    }
    if let Some(contact) = &job.recruiter_contact {
        println!("Recruiter: {}", contact);
    }
    if let Some(url) = &job.url {
        println!("URL: {}", url);
    }
    println!("Last updated: {}", format_timestamp(&job.last_updated));

    if let Some(cv) = &job.cv_match {
        println!("\n--- CV Match: {}% ---", format_score(match_score(job)));
        for (name, sub) in cv.sub_scores() {
            if let Some(score) = sub.and_then(|s| s.score.as_ref()) {
                println!("  {:<13} {}", name, score);
            }
        }

        let counts = requirement_counts(cv.requirements());
        if counts.total > 0 {
            println!(
                "  Requirements: {} can do well ({}%), {} can transfer ({}%), {} must learn ({}%)",
                counts.can_do_well,
                counts.percentages.can_do_well,
                counts.can_transfer,
                counts.percentages.can_transfer,
                counts.must_learn,
                counts.percentages.must_learn
            );
            for requirement in cv.requirements() {
                println!("    [{}] {}", requirement.status.as_str(), requirement.requirement);
            }
        }

        let skills = matched_skills(job);
        if !skills.is_empty() {
            println!("  Matched skills: {}", skills.join(", "));
        }
    }

    if let Some(requirements) = &job.requirements {
        println!("\n--- Requirements ---");
        for line in requirements.lines() {
            println!("{}", line);
        }
    }
    if let Some(notes) = &job.interview_notes {
        println!("\n--- Interview Notes ---\n{}", notes);
    }
    if let Some(letter) = &job.cover_letter {
        println!("\n--- Cover Letter ---\n{}", letter);
    }
    if let Some(description) = &job.job_description {
        println!("\n--- Description ---\n{}", textwrap::fill(description, 80));
    }
}
