//! Directory reconciliation.
//!
//! Walks the immediate children of a library root and gives every game its
//! own folder named after the image header: existing folders are renamed,
//! loose images get a fresh folder and are moved into it.
//!
//! Each entry is handled on its own. A failure is recorded as a typed
//! [`EntryOutcome::Failed`] and the pass carries on with the next entry.

use crate::config::EntryFilter;
use crate::header::{self, HeaderError};
use crate::report::ReconcileReport;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// How a root entry is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A subdirectory, renamed after its first disc image.
    Folder,
    /// A loose disc image, moved into a new folder.
    DiscImage,
    /// Anything else, left alone.
    Other,
}

/// One child of the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// A filesystem change derived from an image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Rename a folder within the root.
    RenameFolder { from: PathBuf, to: PathBuf },
    /// Create `folder` and move `file` into it, keeping its name.
    CreateFolderAndMove { file: PathBuf, folder: PathBuf },
}

impl Action {
    /// The root-level path this action claims.
    pub fn destination(&self) -> &Path {
        match self {
            Self::RenameFolder { to, .. } => to,
            Self::CreateFolderAndMove { folder, .. } => folder,
        }
    }
}

/// What happened to a single entry.
#[derive(Debug)]
pub enum EntryOutcome {
    /// The action was carried out.
    Applied(Action),
    /// Dry run: the action that would have been carried out.
    Planned(Action),
    /// The folder already has the right name.
    Unchanged { path: PathBuf },
    /// The folder holds no disc images.
    NoImages { path: PathBuf },
    Failed {
        path: PathBuf,
        error: ReconcileError,
    },
}

impl EntryOutcome {
    /// Stable status label used in reports.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Applied(Action::RenameFolder { .. }) => "renamed",
            Self::Applied(Action::CreateFolderAndMove { .. }) => "moved",
            Self::Planned(Action::RenameFolder { .. }) => "would_rename",
            Self::Planned(Action::CreateFolderAndMove { .. }) => "would_move",
            Self::Unchanged { .. } => "unchanged",
            Self::NoImages { .. } => "no_images",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Errors that can occur while reconciling a library root.
#[derive(Debug)]
pub enum ReconcileError {
    /// A directory listing could not be read.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The header of an image could not be decoded.
    Header { image: PathBuf, source: HeaderError },
    /// The identity cannot be used as a single folder name.
    InvalidFolderName { name: String },
    /// Another entry already owns the target name.
    DestinationExists { path: PathBuf },
    /// Failed to rename a folder.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create the folder for a loose image.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a loose image into its new folder.
    FileMoveFailure {
        file: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Stable identifier of the failure cause.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReadDirFailed { .. } => "read_dir_failed",
            Self::Header { source, .. } => match source {
                HeaderError::Io(_) => "unreadable_image",
                HeaderError::Truncated { .. } => "truncated_header",
                HeaderError::InvalidGameId { .. } => "invalid_game_id",
                HeaderError::InvalidTitle { .. } => "invalid_title",
                HeaderError::UnterminatedTitle { .. } => "unterminated_title",
            },
            Self::InvalidFolderName { .. } => "invalid_folder_name",
            Self::DestinationExists { .. } => "destination_exists",
            Self::RenameFailed { .. } => "rename_failed",
            Self::DirectoryCreationFailed { .. } => "create_dir_failed",
            Self::FileMoveFailure { .. } => "move_failed",
        }
    }
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::Header { image, source } => {
                write!(f, "{}: {}", image.display(), source)
            }
            Self::InvalidFolderName { name } => {
                write!(f, "'{}' cannot be used as a folder name", name)
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::RenameFailed { from, to, source } => write!(
                f,
                "Failed to rename {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                file,
                destination,
                source,
            } => write!(
                f,
                "Failed to move {} to {}: {}",
                file.display(),
                destination.display(),
                source
            ),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadDirFailed { source, .. }
            | Self::RenameFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::FileMoveFailure { source, .. } => Some(source),
            Self::Header { source, .. } => Some(source),
            Self::InvalidFolderName { .. } | Self::DestinationExists { .. } => None,
        }
    }
}

/// Result type for reconcile operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Reorganizes the immediate children of a library root.
pub struct Reconciler {
    root: PathBuf,
    filter: EntryFilter,
    dry_run: bool,
    // Destinations taken by planned actions during a dry run
    claimed: HashSet<PathBuf>,
    // Names given up by planned actions during a dry run
    vacated: HashSet<PathBuf>,
}

impl Reconciler {
    /// Creates a reconciler for `root` with no filters, not in dry-run mode.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: EntryFilter::default(),
            dry_run: false,
            claimed: HashSet::new(),
            vacated: HashSet::new(),
        }
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// In dry-run mode headers are read and collisions checked, but nothing
    /// on disk is touched.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Lists and classifies the children of the root, in filesystem order.
    ///
    /// Entries rejected by the filter are classified as [`EntryKind::Other`].
    /// A child the listing fails on is kept as an `Err` so it can be reported
    /// with [`Reconciler::process_listed`].
    pub fn scan(&self) -> ReconcileResult<Vec<ReconcileResult<ScannedEntry>>> {
        let entries = fs::read_dir(&self.root).map_err(|e| ReconcileError::ReadDirFailed {
            path: self.root.clone(),
            source: e,
        })?;

        Ok(entries
            .map(|entry| -> ReconcileResult<ScannedEntry> {
                let path = entry
                    .map_err(|e| ReconcileError::ReadDirFailed {
                        path: self.root.clone(),
                        source: e,
                    })?
                    .path();
                let kind = if !self.filter.should_include(&path) {
                    EntryKind::Other
                } else if path.is_dir() {
                    EntryKind::Folder
                } else if path.is_file() && header::is_disc_image_name(&path) {
                    EntryKind::DiscImage
                } else {
                    EntryKind::Other
                };
                Ok(ScannedEntry { path, kind })
            })
            .collect())
    }

    /// Handles one item of [`Reconciler::scan`]. An unlistable child becomes
    /// a failure recorded against the root.
    pub fn process_listed(
        &mut self,
        listed: ReconcileResult<ScannedEntry>,
    ) -> Option<EntryOutcome> {
        match listed {
            Ok(entry) => self.process(&entry),
            Err(error) => Some(EntryOutcome::Failed {
                path: self.root.clone(),
                error,
            }),
        }
    }

    /// Handles one scanned entry. Returns `None` for ignored entries.
    pub fn process(&mut self, entry: &ScannedEntry) -> Option<EntryOutcome> {
        let result = match entry.kind {
            EntryKind::Folder => self.process_folder(&entry.path),
            EntryKind::DiscImage => self.process_image(&entry.path),
            EntryKind::Other => return None,
        };

        Some(result.unwrap_or_else(|error| EntryOutcome::Failed {
            path: entry.path.clone(),
            error,
        }))
    }

    /// Runs a full pass over the root and collects every outcome.
    ///
    /// Only a failure to list the root itself is returned as an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use discfold::reconciler::Reconciler;
    ///
    /// let report = Reconciler::new("/games").reconcile().unwrap();
    /// for (path, error) in report.failures() {
    ///     eprintln!("{}: {}", path.display(), error);
    /// }
    /// ```
    pub fn reconcile(&mut self) -> ReconcileResult<ReconcileReport> {
        let entries = self.scan()?;
        let mut report = ReconcileReport::new(self.root.clone(), self.dry_run);

        for listed in entries {
            match self.process_listed(listed) {
                Some(outcome) => report.record(outcome),
                None => report.record_ignored(),
            }
        }

        Ok(report)
    }

    fn process_folder(&mut self, folder: &Path) -> ReconcileResult<EntryOutcome> {
        let Some(image) = first_disc_image(folder)? else {
            return Ok(EntryOutcome::NoImages {
                path: folder.to_path_buf(),
            });
        };

        let target = self.target_path(folder, &image)?;
        if target == folder {
            return Ok(EntryOutcome::Unchanged {
                path: folder.to_path_buf(),
            });
        }

        self.execute(Action::RenameFolder {
            from: folder.to_path_buf(),
            to: target,
        })
    }

    fn process_image(&mut self, image: &Path) -> ReconcileResult<EntryOutcome> {
        let folder = self.target_path(image, image)?;

        self.execute(Action::CreateFolderAndMove {
            file: image.to_path_buf(),
            folder,
        })
    }

    /// Reads the identity of `image` and builds the root-level path for `entry`.
    fn target_path(&self, entry: &Path, image: &Path) -> ReconcileResult<PathBuf> {
        let name = header::read_identity(image).map_err(|source| ReconcileError::Header {
            image: image.to_path_buf(),
            source,
        })?;

        if !is_single_component(&name) {
            return Err(ReconcileError::InvalidFolderName { name });
        }

        let parent = entry.parent().unwrap_or(&self.root);
        Ok(parent.join(name))
    }

    /// Whether the action's destination is taken, counting the effect of
    /// earlier planned actions in a dry run.
    fn is_occupied(&self, action: &Action) -> bool {
        let destination = action.destination();
        if self.claimed.contains(destination) {
            return true;
        }
        if destination.symlink_metadata().is_err() || self.vacated.contains(destination) {
            return false;
        }
        // A case-only rename on a case-insensitive filesystem finds itself
        match action {
            Action::RenameFolder { from, to } => !same_entry(from, to),
            Action::CreateFolderAndMove { .. } => true,
        }
    }

    fn execute(&mut self, action: Action) -> ReconcileResult<EntryOutcome> {
        if self.is_occupied(&action) {
            return Err(ReconcileError::DestinationExists {
                path: action.destination().to_path_buf(),
            });
        }

        if self.dry_run {
            let vacated = match &action {
                Action::RenameFolder { from, .. } => from,
                Action::CreateFolderAndMove { file, .. } => file,
            };
            self.vacated.insert(vacated.clone());
            self.vacated.remove(action.destination());
            self.claimed.remove(vacated);
            self.claimed.insert(action.destination().to_path_buf());
            return Ok(EntryOutcome::Planned(action));
        }

        match &action {
            Action::RenameFolder { from, to } => {
                fs::rename(from, to).map_err(|e| ReconcileError::RenameFailed {
                    from: from.clone(),
                    to: to.clone(),
                    source: e,
                })?;
            }
            Action::CreateFolderAndMove { file, folder } => {
                move_into_new_folder(file, folder)?;
            }
        }

        Ok(EntryOutcome::Applied(action))
    }
}

/// Returns the first disc image directly inside `dir`, in listing order.
pub fn first_disc_image(dir: &Path) -> ReconcileResult<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ReconcileError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| ReconcileError::ReadDirFailed {
                path: dir.to_path_buf(),
                source: e,
            })?
            .path();
        if path.is_file() && header::is_disc_image_name(&path) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Creates `folder` and moves `file` into it under its own name.
///
/// No rollback: if the move fails the new folder stays behind.
fn move_into_new_folder(file: &Path, folder: &Path) -> ReconcileResult<()> {
    fs::create_dir(folder).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => ReconcileError::DestinationExists {
            path: folder.to_path_buf(),
        },
        _ => ReconcileError::DirectoryCreationFailed {
            path: folder.to_path_buf(),
            source: e,
        },
    })?;

    let file_name = file
        .file_name()
        .ok_or_else(|| ReconcileError::FileMoveFailure {
            file: file.to_path_buf(),
            destination: folder.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        })?;
    let destination = folder.join(file_name);

    fs::rename(file, &destination).map_err(|e| ReconcileError::FileMoveFailure {
        file: file.to_path_buf(),
        destination,
        source: e,
    })
}

/// True when both paths name the same directory entry, such as two spellings
/// that differ only in case on a case-insensitive filesystem. Symlinks are
/// not followed.
fn same_entry(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (a.symlink_metadata(), b.symlink_metadata()) {
            (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
            _ => false,
        }
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == OsStr::new(name)
    )
}
