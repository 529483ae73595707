//! End-of-run report.
//!
//! Collects the outcome of every processed entry so failures can be listed
//! together after the pass, and optionally written out as JSON.

use crate::reconciler::{Action, EntryOutcome, ReconcileError};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcomes of one reconcile pass, in processing order.
#[derive(Debug)]
pub struct ReconcileReport {
    /// RFC 3339 timestamp of when the pass started.
    pub timestamp: String,
    pub root: PathBuf,
    pub dry_run: bool,
    pub outcomes: Vec<EntryOutcome>,
    /// Entries that were neither folders nor disc images, or were filtered out.
    pub ignored: usize,
}

impl ReconcileReport {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            root,
            dry_run,
            outcomes: Vec::new(),
            ignored: 0,
        }
    }

    pub fn record(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    fn count(&self, status: &str) -> usize {
        self.outcomes.iter().filter(|o| o.status() == status).count()
    }

    /// Folders renamed.
    pub fn renamed(&self) -> usize {
        self.count("renamed")
    }

    /// Loose images moved into new folders.
    pub fn moved(&self) -> usize {
        self.count("moved")
    }

    /// Dry-run actions of either kind.
    pub fn planned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Planned(_)))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.count("unchanged")
    }

    pub fn no_images(&self) -> usize {
        self.count("no_images")
    }

    /// Iterates over failed entries and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ReconcileError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            EntryOutcome::Failed { path, error } => Some((path.as_path(), error)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(EntryOutcome::is_failure)
    }

    /// Number of entries that were looked at (ignored ones excluded).
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Non-zero counts per outcome, labelled for display.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        let rows = if self.dry_run {
            vec![
                ("Would rename", self.count("would_rename")),
                ("Would move", self.count("would_move")),
            ]
        } else {
            vec![("Renamed", self.renamed()), ("Moved", self.moved())]
        };

        rows.into_iter()
            .chain([
                ("Already organized", self.unchanged()),
                ("No disc images", self.no_images()),
                ("Failed", self.failures().count()),
                ("Ignored", self.ignored),
            ])
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Renders the report as JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "timestamp": self.timestamp,
            "root": self.root.to_string_lossy(),
            "dry_run": self.dry_run,
            "ignored": self.ignored,
            "entries": self.outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
        })
    }

    /// Writes the JSON report to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json_string = serde_json::to_string_pretty(&self.to_json()).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;

        fs::write(path, json_string)
    }
}

fn outcome_json(outcome: &EntryOutcome) -> Value {
    let status = outcome.status();
    match outcome {
        EntryOutcome::Applied(action) | EntryOutcome::Planned(action) => match action {
            Action::RenameFolder { from, to } => json!({
                "status": status,
                "from": from.to_string_lossy(),
                "to": to.to_string_lossy(),
            }),
            Action::CreateFolderAndMove { file, folder } => json!({
                "status": status,
                "file": file.to_string_lossy(),
                "folder": folder.to_string_lossy(),
            }),
        },
        EntryOutcome::Unchanged { path } | EntryOutcome::NoImages { path } => json!({
            "status": status,
            "path": path.to_string_lossy(),
        }),
        EntryOutcome::Failed { path, error } => json!({
            "status": status,
            "path": path.to_string_lossy(),
            "kind": error.kind(),
            "error": error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_report() -> ReconcileReport {
        let mut report = ReconcileReport::new(PathBuf::from("/games"), false);
        report.record(EntryOutcome::Applied(Action::RenameFolder {
            from: PathBuf::from("/games/zelda"),
            to: PathBuf::from("/games/Zelda [GZLE01]"),
        }));
        report.record(EntryOutcome::Applied(Action::CreateFolderAndMove {
            file: PathBuf::from("/games/kart.wbfs"),
            folder: PathBuf::from("/games/RMCE01_Mario Kart Wii"),
        }));
        report.record(EntryOutcome::NoImages {
            path: PathBuf::from("/games/saves"),
        });
        report.record(EntryOutcome::Failed {
            path: PathBuf::from("/games/dupe.iso"),
            error: ReconcileError::DestinationExists {
                path: PathBuf::from("/games/Zelda [GZLE01]"),
            },
        });
        report.record_ignored();
        report
    }

    #[test]
    fn test_counts() {
        let report = sample_report();

        assert_eq!(report.renamed(), 1);
        assert_eq!(report.moved(), 1);
        assert_eq!(report.no_images(), 1);
        assert_eq!(report.unchanged(), 0);
        assert_eq!(report.processed(), 4);
        assert!(report.has_failures());
        assert_eq!(
            report.counts(),
            vec![
                ("Renamed", 1),
                ("Moved", 1),
                ("No disc images", 1),
                ("Failed", 1),
                ("Ignored", 1),
            ]
        );
    }

    #[test]
    fn test_empty_report_has_no_rows() {
        let report = ReconcileReport::new(PathBuf::from("/games"), true);
        assert!(report.counts().is_empty());
        assert!(!report.has_failures());
    }

    #[test]
    fn test_failures_iterator() {
        let report = sample_report();
        let failures: Vec<_> = report.failures().collect();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, Path::new("/games/dupe.iso"));
        assert_eq!(failures[0].1.kind(), "destination_exists");
    }

    #[test]
    fn test_json_layout() {
        let json = sample_report().to_json();

        assert_eq!(json["root"], "/games");
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["ignored"], 1);
        assert_eq!(json["entries"][0]["status"], "renamed");
        assert_eq!(json["entries"][0]["to"], "/games/Zelda [GZLE01]");
        assert_eq!(json["entries"][1]["status"], "moved");
        assert_eq!(json["entries"][3]["kind"], "destination_exists");
    }

    #[test]
    fn test_save_writes_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("report.json");

        sample_report().save(&path).expect("Failed to save report");

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["entries"].as_array().unwrap().len(), 4);
        assert!(saved["timestamp"].as_str().is_some());
    }
}
