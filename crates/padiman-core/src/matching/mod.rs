//! Matching and pricing: who sees which task, and what it costs.

pub mod pricing;
pub mod ranking;

pub use self::pricing::{Pricing, finders_fee, trip_cost};
pub use self::ranking::{RankedTask, nearby, rank_by_proximity, target_of};
