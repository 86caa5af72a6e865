//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Synchronize VoIP call recordings to a local directory.
///
/// Each run is one synchronization pass: new recordings on the remote side
/// are downloaded, already-synchronized ones are skipped. Repetition is an
/// external concern (cron, systemd timer).
#[derive(Parser, Debug)]
#[command(name = "recsync")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "recsync.toml")]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["recsync"]).unwrap();
        assert_eq!(args.config, PathBuf::from("recsync.toml"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_config_flag() {
        let args = Args::try_parse_from(["recsync", "-c", "/etc/recsync.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/recsync.toml"));

        let args = Args::try_parse_from(["recsync", "--config", "other.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["recsync", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["recsync", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["recsync", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["recsync", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["recsync", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
