use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `memo` binary.
#[derive(Debug, Parser)]
#[command(name = "memo", version, about = "Memoreee - identity and tier resolution")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only in logs)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use memo_core::AuthMethod;

    use super::subcommands::MappingsCommands;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_and_after_subcommand() {
        let cli = Cli::try_parse_from(["memo", "--format", "raw", "anon", "--verbose"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Anon));
    }

    #[test]
    fn resolve_parses_method_and_id() {
        let cli = Cli::try_parse_from(["memo", "resolve", "wallet", "0xABCDEF0123456789"])
            .expect("cli should parse");
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.method, AuthMethod::Wallet);
        assert_eq!(args.external_id, "0xABCDEF0123456789");
    }

    #[test]
    fn resolve_rejects_anonymous_and_unknown_methods() {
        assert!(Cli::try_parse_from(["memo", "resolve", "anonymous", "x"]).is_err());
        assert!(Cli::try_parse_from(["memo", "resolve", "phone", "x"]).is_err());
    }

    #[test]
    fn tier_signals_are_optional() {
        let cli = Cli::try_parse_from(["memo", "tier", "--email", "user-1"])
            .expect("cli should parse");
        let Commands::Tier(args) = cli.command else {
            panic!("expected tier");
        };
        assert_eq!(args.email.as_deref(), Some("user-1"));
        assert_eq!(args.wallet, None);
    }

    #[test]
    fn mappings_info_requires_token() {
        assert!(Cli::try_parse_from(["memo", "mappings", "info"]).is_err());
        let cli = Cli::try_parse_from(["memo", "mappings", "info", "abc"]).expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Mappings {
                action: MappingsCommands::Info { .. }
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["memo", "--format", "xml", "anon"]).is_err());
    }
}
