use clap::Subcommand;

/// Mapping store commands.
#[derive(Clone, Debug, Subcommand)]
pub enum MappingsCommands {
    /// List every email and wallet mapping, oldest first.
    List,
    /// Show the mapping behind a token, following redirects.
    Info {
        /// Identity token.
        token: String,
    },
    /// Delete all mappings, redirects, and the anonymous id.
    Clear,
    /// Upgrade stored data to the current token scheme.
    Migrate,
}
