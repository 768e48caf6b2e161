//! Single owner of chunk reference swaps.
//!
//! Upgrade tasks never touch chunk references themselves: they send a
//! [`TierUpgrade`] and wait for the answer. Applying a swap and deleting the
//! file it replaced happen here, under the session lock.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::assembler::remove_quietly;
use crate::mixer::{TierUpgrade, UpgradeReceiver};
use crate::session::{SessionContext, SwapOutcome};

/// Apply one upgrade and answer it.
pub async fn apply(ctx: &SessionContext, upgrade: TierUpgrade) {
    let TierUpgrade {
        index,
        tier,
        from,
        to,
        ack,
    } = upgrade;

    let outcome = {
        let mut state = ctx.lock().await;
        let outcome = state.apply_upgrade(index, tier, &from, &to);
        let stale = match outcome {
            SwapOutcome::Applied => &from,
            SwapOutcome::Retired => &to,
        };
        remove_quietly(stale).await;
        outcome
    };

    debug!(session = %ctx.id(), chunk = index, %tier, ?outcome, "Applied tier upgrade");
    // The upgrade task may have gone away; nothing to report then
    let _ = ack.send(outcome);
}

/// Drain upgrade requests until the worker stops.
///
/// Requests still queued when `cancel` fires are dropped unanswered, which
/// their senders read as `Retired`.
pub async fn run(ctx: Arc<SessionContext>, mut upgrades: UpgradeReceiver, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            next = upgrades.recv() => match next {
                Some(upgrade) => apply(&ctx, upgrade).await,
                None => break,
            },
        }
    }
    debug!(session = %ctx.id(), "Upgrade applier stopped");
}
