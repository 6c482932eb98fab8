use std::path::PathBuf;

/// Runtime settings. Every value is optional; missing ones fall back to defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Config {
            db_path: std::env::var_os("JOBTRACK_DB")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        }
    }

    /// The `--db` flag beats `JOBTRACK_DB`, which beats the platform default.
    pub fn resolve_db_path(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.db_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_environment() {
        let config = Config {
            db_path: Some(PathBuf::from("/env/jobs.db")),
            rust_log: "warn".into(),
        };
        assert_eq!(
            config.resolve_db_path(Some(PathBuf::from("/flag/jobs.db"))),
            Some(PathBuf::from("/flag/jobs.db"))
        );
        assert_eq!(config.resolve_db_path(None), Some(PathBuf::from("/env/jobs.db")));
    }
}
