//! Console output.
//!
//! All user-facing messages go through [`OutputFormatter`] so styling stays
//! consistent. Colors honour `NO_COLOR`.

use crate::reconciler::{Action, EntryOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Formats and prints CLI messages.
///
/// Covers:
/// - Status lines (success, error, warning, info, dry-run notices)
/// - One line per reconciled entry
/// - The progress bar over root entries
/// - The end-of-run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use discfold::output::OutputFormatter;
    /// OutputFormatter::success("Organization complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use discfold::output::OutputFormatter;
    /// OutputFormatter::error("Could not resolve path: /mnt/wii");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use discfold::output::OutputFormatter;
    /// OutputFormatter::warning("'Homebrew' has no .iso or .wbfs files, skipped");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use discfold::output::OutputFormatter;
    /// OutputFormatter::info("Organizing contents of: /mnt/wii/games");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints `message` in yellow behind a `[DRY RUN]` tag.
    ///
    /// # Arguments
    ///
    /// * `message` - What would have happened
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar over `total` entries.
    ///
    /// The bar only draws on a terminal; print through
    /// [`ProgressBar::suspend`] while it is active.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the line describing one entry's outcome.
    pub fn outcome(outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Applied(Action::RenameFolder { from, to }) => Self::success(&format!(
                "Renamed {} → {}",
                display_name(from),
                display_name(to)
            )),
            EntryOutcome::Applied(Action::CreateFolderAndMove { file, folder }) => {
                Self::success(&format!(
                    "Moved {} into {}/",
                    display_name(file),
                    display_name(folder)
                ))
            }
            EntryOutcome::Planned(Action::RenameFolder { from, to }) => {
                Self::dry_run_notice(&format!(
                    "Would rename {} → {}",
                    display_name(from),
                    display_name(to)
                ))
            }
            EntryOutcome::Planned(Action::CreateFolderAndMove { file, folder }) => {
                Self::dry_run_notice(&format!(
                    "Would move {} into {}/",
                    display_name(file),
                    display_name(folder)
                ))
            }
            EntryOutcome::Unchanged { path } => {
                Self::plain(&format!("  {} is already organized", display_name(path)))
            }
            EntryOutcome::NoImages { path } => Self::warning(&format!(
                "{} has no .iso or .wbfs files, skipped",
                display_name(path)
            )),
            EntryOutcome::Failed { path, error } => Self::error(&format!(
                "{} [{}]: {}",
                display_name(path),
                error.kind(),
                error
            )),
        }
    }

    /// Prints a table of outcome counts.
    pub fn summary_table(rows: &[(&str, usize)], total: usize) {
        println!("\n{}", "SUMMARY".bold());

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(7);

        println!(
            "{:<width$} | {}",
            "Outcome".bold(),
            "Entries".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (label, count) in rows {
            let count = if *label == "Failed" {
                count.to_string().red()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, count, width = width);
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Total".bold(),
            total.to_string().green().bold(),
            width = width
        );
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| format!("'{}'", name.to_string_lossy()))
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_last_component() {
        assert_eq!(
            display_name(Path::new("/games/Zelda [GZLE01]")),
            "'Zelda [GZLE01]'"
        );
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = OutputFormatter::create_progress_bar(7);
        assert_eq!(pb.length(), Some(7));
    }
}
