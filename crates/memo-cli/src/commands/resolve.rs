use memo_core::{AuthMethod, IdentityToken};
use serde::Serialize;

use crate::bootstrap::Identity;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::ResolveArgs;
use crate::output::output;

#[derive(Serialize)]
struct ResolveResponse {
    auth_method: AuthMethod,
    external_id: String,
    token: IdentityToken,
}

pub fn handle(args: &ResolveArgs, identity: &Identity, flags: &GlobalFlags) -> anyhow::Result<()> {
    let token = identity.resolve(args.method, Some(args.external_id.as_str()))?;
    output(
        &ResolveResponse {
            auth_method: args.method,
            external_id: args.external_id.clone(),
            token,
        },
        flags.format,
    )
}
