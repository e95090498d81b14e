use memo_config::MemoConfig;
use memo_session::{SessionCoordinator, StaticEmailProvider, StaticWalletProvider};

use crate::bootstrap::Identity;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::TierArgs;
use crate::output::output;

/// Run the startup probe against providers that report exactly the given
/// sessions, and print the settled session.
pub async fn handle(
    args: TierArgs,
    identity: Identity,
    config: &MemoConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let wallet = args
        .wallet
        .map_or_else(StaticWalletProvider::logged_out, StaticWalletProvider::logged_in);
    let email = args
        .email
        .map_or_else(StaticEmailProvider::signed_out, StaticEmailProvider::signed_in);

    let coordinator = SessionCoordinator::from_config(wallet, email, identity, &config.session);
    let session = coordinator.initialize().await?;
    output(&session, flags.format)
}
