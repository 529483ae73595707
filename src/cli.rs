//! Command-line interface module for discfold.
//!
//! Interprets the positional arguments, loads configuration and drives a
//! reconcile pass with console output and an end-of-run summary.

use crate::config::Config;
use crate::output::OutputFormatter;
use crate::reconciler::Reconciler;
use crate::report::ReconcileReport;
use std::path::{Path, PathBuf};

pub const USAGE: &str = "Usage: discfold [--dry-run] [--config <FILE>] [--report <FILE>] [<option>] [<path>]";

/// What the positional arguments ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Organize this directory.
    Organize(PathBuf),
    /// The single path argument is missing or not a directory.
    UnresolvedPath(PathBuf),
    /// `<option> <path>`: accepted, reserved for future options.
    Reserved { option: String, path: PathBuf },
    /// Too many arguments.
    Usage,
}

impl Invocation {
    /// Interprets positional arguments; no arguments means `cwd`.
    ///
    /// # Examples
    ///
    /// ```
    /// use discfold::cli::Invocation;
    /// use std::path::Path;
    ///
    /// let invocation = Invocation::from_args(&[], Path::new("/games"));
    /// assert_eq!(invocation, Invocation::Organize("/games".into()));
    /// ```
    pub fn from_args(args: &[String], cwd: &Path) -> Self {
        match args {
            [] => Self::Organize(cwd.to_path_buf()),
            [path] => {
                let path = PathBuf::from(path);
                if path.is_dir() {
                    Self::Organize(path)
                } else {
                    Self::UnresolvedPath(path)
                }
            }
            [option, path] => Self::Reserved {
                option: option.clone(),
                path: PathBuf::from(path),
            },
            _ => Self::Usage,
        }
    }
}

/// Flags that apply to an organize run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
    /// Where to write the JSON report.
    pub report_path: Option<PathBuf>,
}

/// Runs the CLI for an already interpreted invocation.
///
/// Per-entry failures are printed but never turn into an `Err`; only setup
/// problems (bad configuration, unreadable root) do.
///
/// # Examples
///
/// ```no_run
/// use discfold::cli::{Invocation, RunOptions, run_cli};
///
/// let invocation = Invocation::Organize("/path/to/games".into());
/// if let Err(e) = run_cli(invocation, &RunOptions::default()) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(invocation: Invocation, options: &RunOptions) -> Result<(), String> {
    match invocation {
        Invocation::Organize(root) => organize_directory(&root, options).map(|_| ()),
        Invocation::UnresolvedPath(path) => {
            OutputFormatter::error(&format!("Could not resolve path: {}", path.display()));
            OutputFormatter::plain("  1. Path is not a directory");
            OutputFormatter::plain("  2. Path does not exist");
            Ok(())
        }
        Invocation::Reserved { option, path } => {
            OutputFormatter::warning(&format!(
                "Option '{}' is not supported yet, nothing was done to {}",
                option,
                path.display()
            ));
            Ok(())
        }
        Invocation::Usage => {
            OutputFormatter::plain(USAGE);
            Ok(())
        }
    }
}

/// Organizes every game under `root` into its own folder.
///
/// This function:
/// 1. Loads and compiles the entry filters
/// 2. Scans the root's immediate children
/// 3. Renames folders and relocates loose images, one entry at a time
/// 4. Prints each outcome and a summary table
/// 5. Writes the JSON report if one was requested
pub fn organize_directory(root: &Path, options: &RunOptions) -> Result<ReconcileReport, String> {
    let config = Config::load(options.config_path.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filter = config
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let mut reconciler = Reconciler::new(root)
        .with_filter(filter)
        .dry_run(options.dry_run);

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", root.display()));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", root.display()));
    }

    let entries = reconciler.scan().map_err(|e| e.to_string())?;
    let mut report = ReconcileReport::new(root.to_path_buf(), options.dry_run);

    let total = entries.len();
    let pb = OutputFormatter::create_progress_bar(total as u64);
    for listed in entries {
        if let Some(name) = listed.as_ref().ok().and_then(|entry| entry.path.file_name()) {
            pb.set_message(name.to_string_lossy().to_string());
        }

        match reconciler.process_listed(listed) {
            Some(outcome) => {
                pb.suspend(|| OutputFormatter::outcome(&outcome));
                report.record(outcome);
            }
            None => report.record_ignored(),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    OutputFormatter::summary_table(&report.counts(), total);

    if let Some(report_path) = &options.report_path {
        match report.save(report_path) {
            Ok(()) => OutputFormatter::info(&format!("Report saved to {}", report_path.display())),
            Err(e) => OutputFormatter::warning(&format!(
                "Could not save report to {}: {}",
                report_path.display(),
                e
            )),
        }
    }

    if report.has_failures() {
        OutputFormatter::warning("Some entries could not be organized. Please review errors above.");
    } else if options.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(report)
}
