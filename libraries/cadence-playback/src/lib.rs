//! Cadence Playback
//!
//! Multi-source playback orchestration.
//!
//! This crate provides:
//! - **Player**: one stateful service over interchangeable backends
//! - **Queue**: ordered queue with shuffle and repeat (none, one, all)
//! - **Notifications**: state, progress and error channels for observers
//! - **Progress sampler**: periodic playhead readout while playing
//! - **Configuration**: TOML file plus `CADENCE_` environment overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_playback::{CadenceConfig, Player, PlayerObserver};
//! use cadence_core::PlayerState;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PlayerObserver for Printer {
//!     fn on_state_change(&self, state: &PlayerState) {
//!         println!("{:?}", state.playback_state());
//!     }
//! }
//!
//! # async fn example() -> cadence_playback::Result<()> {
//! let player = Player::from_config(&CadenceConfig::default())?;
//! player.subscribe(Arc::new(Printer));
//!
//! let tracks = player.search("harry").await?;
//! player.set_queue(tracks.clone());
//! if let Some(first) = tracks.into_iter().next() {
//!     player.play_song(first, Some(0)).await;
//! }
//!
//! player.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod advance;
pub mod config;
pub mod error;
pub mod notify;
pub mod player;
mod sampler;

pub use advance::{next_index, Direction};
pub use config::{CadenceConfig, PlaybackConfig};
pub use error::{PlayerError, Result};
pub use notify::{Notifier, PlayerObserver, SubscriptionId};
pub use player::{Player, PlayerBuilder};
