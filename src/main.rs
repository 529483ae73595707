use clap::Parser;
use discfold::cli::{Invocation, RunOptions, run_cli};
use discfold::output::OutputFormatter;
use std::env;
use std::path::PathBuf;

/// Give every game in a disc-image library its own folder, named from the image header.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show what would be renamed or moved without changing anything
    #[arg(long)]
    dry_run: bool,

    /// TOML file with entry filters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Library directory, optionally preceded by an option (defaults to the current directory)
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            OutputFormatter::error(&format!("Cannot determine current directory: {}", e));
            return;
        }
    };

    let invocation = Invocation::from_args(&cli.args, &cwd);
    let options = RunOptions {
        dry_run: cli.dry_run,
        config_path: cli.config,
        report_path: cli.report,
    };

    if let Err(e) = run_cli(invocation, &options) {
        OutputFormatter::error(&format!("Error: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn invocation(argv: &[&str]) -> Invocation {
        let cli = Cli::try_parse_from(argv).expect("Arguments should parse");
        Invocation::from_args(&cli.args, Path::new("/"))
    }

    #[test]
    fn test_dash_option_with_path_is_reserved() {
        assert_eq!(
            invocation(&["discfold", "-r", "/x"]),
            Invocation::Reserved {
                option: "-r".to_string(),
                path: PathBuf::from("/x"),
            }
        );
    }

    #[test]
    fn test_unknown_long_option_with_path_is_reserved() {
        assert_eq!(
            invocation(&["discfold", "--recursive", "/x"]),
            Invocation::Reserved {
                option: "--recursive".to_string(),
                path: PathBuf::from("/x"),
            }
        );
    }

    #[test]
    fn test_dash_arguments_past_two_print_usage() {
        assert_eq!(invocation(&["discfold", "-a", "-b", "-c"]), Invocation::Usage);
    }

    #[test]
    fn test_known_flags_before_positionals() {
        let cli = Cli::try_parse_from(["discfold", "--dry-run", "--report", "out.json", "-r", "/x"])
            .expect("Arguments should parse");

        assert!(cli.dry_run);
        assert_eq!(cli.report, Some(PathBuf::from("out.json")));
        assert_eq!(cli.args, vec!["-r".to_string(), "/x".to_string()]);
    }
}
