use anyhow::Context;
use memo_core::{IdentityMapping, IdentityToken};
use serde::Serialize;

use crate::bootstrap::Identity;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::MappingsCommands;
use crate::output::output;

#[derive(Serialize)]
struct ClearResponse {
    removed: usize,
}

#[derive(Serialize)]
struct MigrateResponse {
    wallet_mappings: usize,
    anonymous_id: bool,
}

#[derive(Serialize)]
struct InfoResponse {
    token: IdentityToken,
    mapping: Option<IdentityMapping>,
}

/// Handle `memo mappings <subcommand>`.
pub fn handle(
    action: &MappingsCommands,
    identity: &Identity,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        MappingsCommands::List => output(&identity.mapper().mappings()?, flags.format),
        MappingsCommands::Info { token } => {
            let token = IdentityToken::new(token.as_str())?;
            let canonical = identity.mapper().canonical(&token)?;
            let mapping = identity
                .mapper()
                .user_info(&canonical)
                .with_context(|| format!("failed to look up {token}"))?;
            output(
                &InfoResponse {
                    token: canonical,
                    mapping,
                },
                flags.format,
            )
        }
        MappingsCommands::Clear => {
            let removed = identity.clear_all()?;
            output(&ClearResponse { removed }, flags.format)
        }
        MappingsCommands::Migrate => {
            let report = identity.run_migrations()?;
            output(
                &MigrateResponse {
                    wallet_mappings: report.wallet_mappings,
                    anonymous_id: report.anonymous_id,
                },
                flags.format,
            )
        }
    }
}
