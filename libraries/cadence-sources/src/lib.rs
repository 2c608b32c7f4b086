//! Cadence Sources
//!
//! Playback backends for the Cadence orchestrator.
//!
//! This crate provides:
//! - **PlaybackSource**: the async backend contract (initialize, transport, search, cleanup)
//! - **LocalSource**: plays files from a scanned local library
//! - **RemoteSource**: streams tracks from a remote catalog (HTTP or the built-in demo catalog)
//! - **SourceFactory**: one cached backend per kind, torn down together
//! - **MediaOutput**: the output handle each backend owns, plus a clock-driven implementation
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_sources::{ClockOutputProvider, SourceFactory, SourcesConfig};
//! use cadence_core::SourceKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> cadence_sources::Result<()> {
//! let factory = SourceFactory::from_config(&SourcesConfig::default(), Arc::new(ClockOutputProvider));
//!
//! let remote = factory.create_source(SourceKind::Remote)?;
//! remote.initialize().await?;
//!
//! let hits = remote.search("blinding").await?;
//! if let Some(track) = hits.first() {
//!     remote.play(track).await?;
//! }
//!
//! factory.cleanup().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod factory;
pub mod local;
pub mod output;
pub mod remote;
pub mod source;
pub mod transport;

pub use config::{LocalSourceConfig, RemoteSourceConfig, SourcesConfig};
pub use error::{Result, SourceError};
pub use factory::{SourceFactory, SourceFactoryBuilder};
pub use local::{LocalLibrary, LocalSource};
pub use output::{
    ClockOutput, ClockOutputProvider, MediaEvent, MediaOutput, MediaRequest, OutputError,
    OutputProvider,
};
pub use remote::{CatalogClient, CatalogError, HttpCatalog, RemoteSource, StaticCatalog};
pub use source::PlaybackSource;
pub use transport::{Playhead, Transport};
