//! # Resolver
//!
//! Collision decision engine.
//!
//! Compares the dominant cardiac and motion peaks of one window and either
//! accepts the cardiac frequency or abstains with a reason code. Windows are
//! independent; the resolver carries no state between calls.

mod resolver;

pub use contracts::{
    CollisionInfo, Estimate, EstimateReason, MissingMotionPolicy, ResolverConfig, SpectralPeak,
};
pub use resolver::{CollisionResolver, Decision};
