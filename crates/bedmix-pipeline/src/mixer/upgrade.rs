//! Messages between upgrade tasks and the worker's swap applier.

use std::path::PathBuf;

use bedmix_core::{MixTier, MixerError};
use tokio::sync::{mpsc, oneshot};

use crate::session::SwapOutcome;

/// A finished tier for one chunk, asking to replace `from` with `to`.
#[derive(Debug)]
pub struct TierUpgrade {
    pub index: u64,
    pub tier: MixTier,
    pub from: PathBuf,
    pub to: PathBuf,
    pub ack: oneshot::Sender<SwapOutcome>,
}

pub type UpgradeSender = mpsc::UnboundedSender<TierUpgrade>;
pub type UpgradeReceiver = mpsc::UnboundedReceiver<TierUpgrade>;

/// Send a swap request and wait for the applier's answer.
///
/// A closed channel or dropped acknowledgement means the worker is gone,
/// which is reported as `Retired`.
pub async fn request_swap(
    swaps: &UpgradeSender,
    index: u64,
    tier: MixTier,
    from: PathBuf,
    to: PathBuf,
) -> SwapOutcome {
    let (ack, answer) = oneshot::channel();
    let upgrade = TierUpgrade {
        index,
        tier,
        from,
        to,
        ack,
    };
    if swaps.send(upgrade).is_err() {
        return SwapOutcome::Retired;
    }
    answer.await.unwrap_or(SwapOutcome::Retired)
}

/// How far one chunk's background upgrade got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub index: u64,
    /// Highest tier that was swapped in.
    pub reached: MixTier,
    /// The chunk was consumed or its worker stopped before a swap.
    pub retired: bool,
    /// Why the upgrade stopped before the final tier, if it did.
    pub stopped_by: Option<MixerError>,
}

impl UpgradeReport {
    pub const fn new(index: u64) -> Self {
        Self {
            index,
            reached: MixTier::Immediate,
            retired: false,
            stopped_by: None,
        }
    }

    pub fn final_skipped(&self) -> bool {
        matches!(self.stopped_by, Some(MixerError::CapacitySkipped { .. }))
    }
}
