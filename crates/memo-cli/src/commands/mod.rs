mod anon;
mod mappings;
mod resolve;
mod tier;

use memo_config::MemoConfig;

use crate::bootstrap::Identity;
use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    identity: &Identity,
    config: &MemoConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Resolve(args) => resolve::handle(&args, identity, flags),
        Commands::Anon => anon::handle(identity, flags),
        Commands::Tier(args) => tier::handle(args, identity.clone(), config, flags).await,
        Commands::Mappings { action } => mappings::handle(&action, identity, flags),
    }
}
