//! Per-source-IP windowed statistics engine.
//!
//! Converts a stream of packet observations into fixed-schema feature vectors
//! suitable for downstream anomaly-detection models. The engine is single-writer
//! and single-threaded by contract (see [`engine`] docs); callers own windowing
//! policy, packet decoding, and everything downstream of a finished
//! [`types::FeatureRecord`].
//!
//! ```text
//! PacketFeatures -> Engine::log -> IpWindow (per source IP)
//!                                       |
//!                                  end_window()
//!                                       v
//!                           WindowHistoryCache (per-IP history)
//!                                       |
//!                          find_candidates() / retrieve_statistics()
//!                                       v
//!                                 FeatureRecord
//! ```

pub mod cache;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod hll;
pub mod output;
pub mod streaming;
pub mod time_source;
pub mod types;
pub mod window;

pub use config::EngineConfig;
pub use engine::{Engine, RetrieveOptions, RetrieveOutcome};
pub use driver::WindowDriver;
pub use types::{FeatureRecord, PacketFeatures, Proto, WindowHistoryEntry};
