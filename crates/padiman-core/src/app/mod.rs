//! App - wiring of ports, stores and settlement into one `Marketplace`.

pub mod builder;

pub use self::builder::{AppBuilder, BuildError, Marketplace};
