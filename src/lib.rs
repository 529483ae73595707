//! discfold - organize a disc-image library into one folder per game
//!
//! This library reads the game ID and title embedded in ISO and WBFS image
//! headers and uses them to rename game folders and to give loose images a
//! folder of their own.

pub mod cli;
pub mod config;
pub mod header;
pub mod identity;
pub mod output;
pub mod reconciler;
pub mod report;

pub use cli::{Invocation, RunOptions, run_cli};
pub use config::{Config, ConfigError, EntryFilter};
pub use header::{ContainerFormat, GameHeader, HeaderError, read_identity};
pub use identity::GameIdentity;
pub use reconciler::{Action, EntryOutcome, ReconcileError, Reconciler};
pub use report::ReconcileReport;
