//! # Contracts
//!
//! Frozen interface contracts shared by every stage of the heart-rate pipeline.
//! All business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Signal time is expressed in seconds (f64) relative to the recording start
//! - Every window is stamped with its **start** time
//! - `window_index` is the ordering key; insertion order equals time order

mod analysis_config;
mod blueprint;
mod error;
mod estimate;
mod signal;
mod sink;
mod spectral;

pub use analysis_config::*;
pub use blueprint::*;
pub use error::*;
pub use estimate::*;
pub use signal::*;
pub use sink::EstimateSink;
pub use spectral::*;
