use crate::scanner::{ScanOutcome, ScanWarning};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsMetadata {
    pub classmap_version: String,
    pub timestamp: DateTime<Utc>,
    pub controller_set: String,
    pub environment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryStatistics {
    pub path: PathBuf,
    pub files_scanned: usize,
    pub files_ignored: usize,
    pub files_skipped: usize,
    pub declarations: usize,
}

impl From<&ScanOutcome> for DirectoryStatistics {
    fn from(outcome: &ScanOutcome) -> Self {
        Self {
            path: outcome.directory.clone(),
            files_scanned: outcome.files_scanned,
            files_ignored: outcome.files_ignored,
            files_skipped: outcome.warnings.len(),
            declarations: outcome.entries.len(),
        }
    }
}

/// What one discovery run did, for the CLI summary and `--stats` exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryStatistics {
    pub metadata: StatisticsMetadata,
    pub from_cache: bool,
    pub directories: Vec<DirectoryStatistics>,
    pub total_classes: usize,
    pub total_edges: usize,
    pub startup_classes: usize,
    pub warnings: Vec<ScanWarning>,
    pub duration_seconds: f64,
}

impl DiscoveryStatistics {
    pub fn new(controller_set: &str, environment: &str) -> Self {
        Self {
            metadata: StatisticsMetadata {
                classmap_version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                controller_set: controller_set.to_string(),
                environment: environment.to_string(),
            },
            from_cache: false,
            directories: Vec::new(),
            total_classes: 0,
            total_edges: 0,
            startup_classes: 0,
            warnings: Vec::new(),
            duration_seconds: 0.0,
        }
    }

    pub fn add_scan(&mut self, outcome: &ScanOutcome) {
        self.directories.push(DirectoryStatistics::from(outcome));
        self.warnings.extend(outcome.warnings.iter().cloned());
    }

    pub fn total_files_scanned(&self) -> usize {
        self.directories.iter().map(|d| d.files_scanned).sum()
    }

    pub fn finish(&mut self, duration: Duration) {
        self.duration_seconds = duration.as_secs_f64();
    }

    pub fn summary(&self) -> String {
        let source = if self.from_cache {
            "loaded from cache".to_string()
        } else {
            format!(
                "scanned {} files in {} directories",
                self.total_files_scanned(),
                self.directories.len()
            )
        };
        format!(
            "{} classes, {} inheritance edges, {} start-up classes ({source}, {} warnings, {:.2}s)",
            self.total_classes,
            self.total_edges,
            self.startup_classes,
            self.warnings.len(),
            self.duration_seconds
        )
    }

    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
