use clap::{Args, Subcommand};
use memo_core::AuthMethod;

use super::subcommands::MappingsCommands;

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Resolve an email account id or wallet address to its identity token.
    Resolve(ResolveArgs),
    /// Show this store's anonymous identity, creating it if needed.
    Anon,
    /// Resolve the session tier from the given provider sessions.
    Tier(TierArgs),
    /// Inspect and maintain stored identity mappings.
    Mappings {
        #[command(subcommand)]
        action: MappingsCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ResolveArgs {
    /// Auth method: email or wallet.
    #[arg(value_parser = parse_external_method)]
    pub method: AuthMethod,
    /// Email account id or wallet address.
    pub external_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct TierArgs {
    /// Signed-in email account id.
    #[arg(long)]
    pub email: Option<String>,
    /// Logged-in wallet address.
    #[arg(long)]
    pub wallet: Option<String>,
}

fn parse_external_method(raw: &str) -> Result<AuthMethod, String> {
    let method: AuthMethod = raw.parse().map_err(|e: memo_core::IdentityError| e.to_string())?;
    if method.requires_external_id() {
        Ok(method)
    } else {
        Err(format!("'{method}' identities are not resolved from an external id; use `memo anon`"))
    }
}
