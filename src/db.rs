use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;

use crate::models::{Job, Priority, Status};

/// Key holding the whole job collection as one JSON array.
const JOBS_KEY: &str = "jobs";

/// Single-file key-value store. The job list is always read and written whole.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddSummary {
    pub added: usize,
    pub updated: usize,
}

impl Database {
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            proj_dirs.data_dir().join("jobtrack.db")
        } else {
            PathBuf::from("jobtrack.db")
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!("Database not initialized. Run 'jobtrack init' first."));
        }
        Ok(())
    }

    // --- Collection ---

    /// Never fails: an unreadable store is treated as empty.
    pub fn load_jobs(&self) -> Vec<Job> {
        match self.try_load_jobs() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!("Could not read stored jobs, starting empty: {e:#}");
                Vec::new()
            }
        }
    }

    fn try_load_jobs(&self) -> Result<Vec<Job>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [JOBS_KEY], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(text) => serde_json::from_str(&text).context("Stored job list is not valid"),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_jobs(&self, jobs: &[Job]) -> Result<()> {
        let text = serde_json::to_string(jobs).context("Failed to serialize jobs")?;
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![JOBS_KEY, text],
        )?;
        tracing::debug!(count = jobs.len(), "saved jobs");
        Ok(())
    }

    // --- Job operations ---

    /// Appends new jobs; a job whose id is already stored replaces the stored one.
    pub fn add_jobs(&self, incoming: Vec<Job>) -> Result<AddSummary> {
        let mut jobs = self.load_jobs();
        let mut summary = AddSummary::default();

        for job in incoming {
            if let Some(existing) = jobs.iter_mut().find(|j| j.id == job.id) {
                *existing = job;
                summary.updated += 1;
            } else {
                jobs.push(job);
                summary.added += 1;
            }
        }

        self.save_jobs(&jobs)?;
        tracing::info!(added = summary.added, updated = summary.updated, "stored imported jobs");
        Ok(summary)
    }

    pub fn get_job(&self, id: &str) -> Result<Job> {
        let jobs = self.load_jobs();
        let idx = find_index(&jobs, id)?;
        Ok(jobs[idx].clone())
    }

    pub fn update_job_status(&self, id: &str, status: Status) -> Result<Job> {
        self.modify_job(id, |job| job.set_status(status))
    }

    pub fn update_job_priority(&self, id: &str, priority: Priority) -> Result<Job> {
        self.modify_job(id, |job| job.set_priority(priority))
    }

    pub fn toggle_hidden(&self, id: &str) -> Result<Job> {
        self.modify_job(id, Job::toggle_hidden)
    }

    pub fn update_notes(&self, id: &str, notes: Option<String>) -> Result<Job> {
        self.modify_job(id, |job| job.set_notes(notes))
    }

    pub fn update_cover_letter(&self, id: &str, letter: Option<String>) -> Result<Job> {
        self.modify_job(id, |job| job.set_cover_letter(letter))
    }

    /// Full edit. The stored id is kept whatever the replacement says.
    pub fn replace_job(&self, id: &str, replacement: Job) -> Result<Job> {
        self.modify_job(id, |job| {
            let id = std::mem::take(&mut job.id);
            *job = replacement;
            job.id = id;
            job.touch();
        })
    }

    pub fn delete_job(&self, id: &str) -> Result<Job> {
        let mut jobs = self.load_jobs();
        let idx = find_index(&jobs, id)?;
        let removed = jobs.remove(idx);
        self.save_jobs(&jobs)?;
        tracing::info!(id = %removed.id, "deleted job");
        Ok(removed)
    }

    fn modify_job<F: FnOnce(&mut Job)>(&self, id: &str, change: F) -> Result<Job> {
        let mut jobs = self.load_jobs();
        let idx = find_index(&jobs, id)?;
        change(&mut jobs[idx]);
        self.save_jobs(&jobs)?;
        Ok(jobs[idx].clone())
    }
}

/// Position of the job with this id, or with this unambiguous id prefix.
pub fn find_index(jobs: &[Job], id: &str) -> Result<usize> {
    if let Some(idx) = jobs.iter().position(|j| j.id == id) {
        return Ok(idx);
    }

    let matches: Vec<usize> = jobs
        .iter()
        .enumerate()
        .filter(|(_, j)| !id.is_empty() && j.id.starts_with(id))
        .map(|(idx, _)| idx)
        .collect();

    match matches.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(anyhow!("Job '{}' not found", id)),
        many => Err(anyhow!(
            "Job id prefix '{}' is ambiguous ({} matches)",
            id,
            many.len()
        )),
    }
}
