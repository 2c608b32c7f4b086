//! Progress sampler
//!
//! Copies the active backend's playhead into the player state on a fixed
//! period while playing. Holds only a weak reference, so it ends once every
//! `Player` handle is gone.

use crate::player::{Player, Shared};
use std::sync::Weak;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

pub(crate) async fn run(shared: Weak<Shared>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        Player::from_shared(shared).sample_progress();
    }

    debug!("Progress sampler stopped");
}
