use memo_core::IdentityToken;
use serde::Serialize;

use crate::bootstrap::Identity;
use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Serialize)]
struct AnonResponse {
    token: IdentityToken,
}

pub fn handle(identity: &Identity, flags: &GlobalFlags) -> anyhow::Result<()> {
    let token = identity.anonymous().get_or_create();
    output(&AnonResponse { token }, flags.format)
}
