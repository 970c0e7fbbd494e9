use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub(crate) const DB_FILE_NAME: &str = "gastomagico.db";
pub(crate) const LOG_FILE_NAME: &str = "gastomagico.log";
pub(crate) const DEFAULT_LOG_FILTER: &str = "warn";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) db_path: PathBuf,
    pub(crate) log_filter: String,
}

impl AppConfig {
    /// `db` and `log_level` come from the command line (clap already folds in
    /// their environment variables). `rust_log` is the raw `RUST_LOG` value.
    pub(crate) fn resolve(
        db: Option<PathBuf>,
        log_level: Option<String>,
        rust_log: Option<String>,
    ) -> Result<Self> {
        let db_path = match db {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    ensure_dir(parent)?;
                }
                path
            }
            None => default_db_path()?,
        };
        Ok(Self {
            db_path,
            log_filter: log_filter(log_level, rust_log),
        })
    }

    /// Dashboard log file, kept next to the database.
    pub(crate) fn log_path(&self) -> PathBuf {
        self.db_path.with_file_name(LOG_FILE_NAME)
    }
}

fn log_filter(log_level: Option<String>, rust_log: Option<String>) -> String {
    log_level
        .into_iter()
        .chain(rust_log)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Message for a log filter that failed to parse and was replaced by the default.
pub(crate) fn filter_warning(filter: &str, err: &dyn std::fmt::Display) -> String {
    format!("Warning: ignoring log filter '{filter}' ({err}); using '{DEFAULT_LOG_FILTER}'")
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "gastomagico", "GastoMagico")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    ensure_dir(data_dir)?;
    Ok(data_dir.join(DB_FILE_NAME))
}
