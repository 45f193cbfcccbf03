//! # IO Utilities
//!
//! File system operations for the `.paperlab` runtime directory and the
//! archive of finished runs under `.paperlab/runs/`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::report::AnalysisReport;

/// Subdirectory of the runtime path holding archived reports
pub const RUNS_DIR: &str = "runs";

/// Get the runtime directory path (.paperlab)
pub fn get_runtime_path() -> PathBuf {
    // Check for environment variable override
    if let Ok(path) = std::env::var("PAPERLAB_RUNTIME_PATH") {
        return PathBuf::from(path);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".paperlab")
}

/// Write a file, creating parent directories as needed
pub async fn write_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();

    // Ensure parent dir exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write file: {:?}", path))
}

/// Read a file if it exists
pub async fn read_optional(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read file: {:?}", path)),
    }
}

/// One line of the run listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub id: String,
    pub model: String,
    pub finished_at: DateTime<Utc>,
    pub hypotheses: usize,
    pub chosen_title: Option<String>,
}

impl From<&AnalysisReport> for RunSummary {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            id: report.id.clone(),
            model: report.model.clone(),
            finished_at: report.finished_at,
            hypotheses: report.hypotheses.len(),
            chosen_title: report.judgement.chosen_title.clone(),
        }
    }
}

/// Archive of finished reports, one pretty-printed JSON file per run
#[derive(Debug, Clone)]
pub struct RunArchive {
    root: PathBuf,
}

impl Default for RunArchive {
    fn default() -> Self {
        Self::new(get_runtime_path().join(RUNS_DIR))
    }
}

impl RunArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        anyhow::ensure!(valid, "Invalid run id: {:?}", id);
        Ok(self.root.join(format!("{}.json", id)))
    }

    /// Save a report, returning the file it was written to
    pub async fn save(&self, report: &AnalysisReport) -> Result<PathBuf> {
        let path = self.path_for(&report.id)?;
        let json = serde_json::to_string_pretty(report)?;
        write_file(&path, &json).await?;
        tracing::info!(id = %report.id, path = ?path, "run archived");
        Ok(path)
    }

    /// Load an archived report; `None` when no run has that id
    pub async fn load(&self, id: &str) -> Result<Option<AnalysisReport>> {
        let path = self.path_for(id)?;
        match read_optional(&path).await? {
            Some(json) => {
                let report = serde_json::from_str(&json)
                    .with_context(|| format!("Failed to parse archived run: {:?}", path))?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// Summaries of every archived run, newest first.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<RunSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to read directory: {:?}", self.root))?;

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|json| Ok(serde_json::from_str::<AnalysisReport>(&json)?));
            match parsed {
                Ok(report) => runs.push(RunSummary::from(&report)),
                Err(e) => tracing::warn!(path = ?path, error = %e, "skipping unreadable run"),
            }
        }

        runs.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
        Ok(runs)
    }
}
