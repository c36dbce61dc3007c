//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`Command`] - Auxiliary subcommands
//!
//! [`Args::merge_config`] turns the parsed flags into a library
//! [`MergeConfig`], so the binary holds no merge logic of its own.
//!
//! ```rust
//! use clap::Parser;
//! use tootpack::cli::Args;
//!
//! let args = Args::parse_from(["tootpack", "outbox.json", "--id-field", "uri"]);
//! let config = args.merge_config();
//! assert_eq!(config.id_field, "uri");
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::{DEFAULT_ID_FIELD, DEFAULT_TIMESTAMP_FIELD, MergeConfig, RichTextKeys};
use crate::sources::DEFAULT_EXTENSION;

/// Merge exported timeline archives into one deduplicated, newest-first
/// dataset, written as nested JSON and flattened CSV.
#[derive(Parser, Debug, Clone)]
#[command(name = "tootpack")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "EXAMPLES:
    tootpack
    tootpack ./data -o merged.json -c merged.csv
    tootpack outbox-1.json outbox-2.json --no-csv
    tootpack ./exports --date-field published --id-field uri
    tootpack check-dups output.json")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Archive files or directories of archives
    #[arg(value_name = "INPUTS", default_value = "./data")]
    pub inputs: Vec<PathBuf>,

    /// Path of the nested JSON output
    #[arg(short = 'o', long, default_value = "output.json")]
    pub json_output: PathBuf,

    /// Path of the flattened CSV output
    #[arg(short = 'c', long, default_value = "output.csv")]
    pub csv_output: PathBuf,

    /// Field used for newest-first ordering
    #[arg(long, value_name = "FIELD", default_value = DEFAULT_TIMESTAMP_FIELD)]
    pub date_field: String,

    /// Field used for deduplication
    #[arg(long, value_name = "FIELD", default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Key pattern marking HTML fields (repeatable; default: content, note)
    #[arg(long = "rich-text-key", value_name = "PATTERN")]
    pub rich_text_keys: Vec<String>,

    /// Key removed from every record (repeatable; default: content_clean)
    #[arg(long = "drop-key", value_name = "KEY")]
    pub drop_keys: Vec<String>,

    /// Extension of archives inside input directories
    #[arg(long, value_name = "EXT", default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Skip writing the CSV output
    #[arg(long, conflicts_with = "no_json")]
    pub no_csv: bool,

    /// Skip writing the JSON output
    #[arg(long)]
    pub no_json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Auxiliary subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report identifiers that occur more than once in a merged JSON file
    #[command(name = "check-dups")]
    CheckDups {
        /// Merged JSON array to audit
        file: PathBuf,

        /// Field holding the identifier
        #[arg(long, value_name = "FIELD", default_value = DEFAULT_ID_FIELD)]
        id_field: String,
    },
}

impl Args {
    /// Builds the library configuration from the flags.
    pub fn merge_config(&self) -> MergeConfig {
        let mut config = MergeConfig::new()
            .with_timestamp_field(self.date_field.clone())
            .with_id_field(self.id_field.clone());

        if !self.rich_text_keys.is_empty() {
            config = config.with_rich_text_keys(RichTextKeys::new(&self.rich_text_keys));
        }
        if !self.drop_keys.is_empty() {
            config = config.with_drop_keys(self.drop_keys.iter().cloned());
        }
        config
    }

    /// Default log filter implied by `-v` / `-q`; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// JSON output path, unless disabled.
    pub fn json_target(&self) -> Option<&std::path::Path> {
        (!self.no_json).then_some(self.json_output.as_path())
    }

    /// CSV output path, unless disabled.
    pub fn csv_target(&self) -> Option<&std::path::Path> {
        (!self.no_csv).then_some(self.csv_output.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tootpack").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.inputs, vec![PathBuf::from("./data")]);
        assert_eq!(args.json_output, PathBuf::from("output.json"));
        assert_eq!(args.csv_output, PathBuf::from("output.csv"));
        assert!(args.command.is_none());
        assert_eq!(args.log_filter(), "info");
        assert_eq!(args.merge_config(), MergeConfig::default());
    }

    #[test]
    fn test_inputs_and_outputs() {
        let args = parse(&["a.json", "dir", "-o", "m.json", "-c", "m.csv"]);
        assert_eq!(args.inputs, vec![PathBuf::from("a.json"), PathBuf::from("dir")]);
        assert_eq!(args.json_target(), Some(std::path::Path::new("m.json")));
        assert_eq!(args.csv_target(), Some(std::path::Path::new("m.csv")));
    }

    #[test]
    fn test_field_and_key_overrides() {
        let args = parse(&[
            "--date-field",
            "published",
            "--id-field",
            "uri",
            "--rich-text-key",
            "summary",
            "--rich-text-key",
            "content",
            "--drop-key",
            "tmp",
        ]);
        let config = args.merge_config();
        assert_eq!(config.timestamp_field, "published");
        assert_eq!(config.id_field, "uri");
        assert!(config.rich_text_keys.matches("summary"));
        assert!(!config.rich_text_keys.matches("note"));
        assert_eq!(config.drop_keys, vec!["tmp"]);
    }

    #[test]
    fn test_disable_outputs() {
        let args = parse(&["--no-csv"]);
        assert!(args.csv_target().is_none());
        assert!(args.json_target().is_some());

        assert!(Args::try_parse_from(["tootpack", "--no-csv", "--no-json"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["-v"]).log_filter(), "debug");
        assert_eq!(parse(&["-vv"]).log_filter(), "trace");
        assert_eq!(parse(&["-q"]).log_filter(), "warn");
        assert!(Args::try_parse_from(["tootpack", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_check_dups_subcommand() {
        let args = parse(&["check-dups", "output.json"]);
        assert_eq!(
            args.command,
            Some(Command::CheckDups {
                file: PathBuf::from("output.json"),
                id_field: "id".to_string(),
            })
        );
    }
}
