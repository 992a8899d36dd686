//! Runtime configuration.
//!
//! Read from environment variables, every key has a default:
//! - `PADIMAN_DATA_DIR` (`.padiman`)
//! - `PADIMAN_TRIP_RATE_PER_KM` (200)
//! - `PADIMAN_FINDERS_FEE_BASE` (50)
//! - `PADIMAN_FINDERS_FEE_PER_KM` (50)
//! - `PADIMAN_FREE_QUOTA` (2)
//! - `PADIMAN_NEARBY_RADIUS_KM` (20)
//! - `PADIMAN_GEO_CACHE_SECS` (300)
//! - `PADIMAN_PROFILE_GEO_STALE_SECS` (86400)

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Pricing knobs, all in naira.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub trip_rate_per_km: u64,
    pub finders_fee_base: u64,
    pub finders_fee_per_km: u64,
    /// Number of a poster's first tasks posted for free.
    pub free_quota: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            trip_rate_per_km: 200,
            finders_fee_base: 50,
            finders_fee_per_km: 50,
            free_quota: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoConfig {
    /// Radius used for the runner's "nearby tasks" list.
    pub nearby_radius_km: f64,
    /// A cached device fix younger than this is reused.
    pub cache_window: Duration,
    /// Profile geo older than this is refreshed.
    pub profile_stale_after: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            nearby_radius_km: 20.0,
            cache_window: Duration::minutes(5),
            profile_stale_after: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub pricing: PricingConfig,
    pub geo: GeoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".padiman"),
            pricing: PricingConfig::default(),
            geo: GeoConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let num = |key: &'static str, default: u64| parse_or(&lookup, key, default);

        let nearby_radius_km =
            parse_or(&lookup, "PADIMAN_NEARBY_RADIUS_KM", defaults.geo.nearby_radius_km)?;
        if !nearby_radius_km.is_finite() || nearby_radius_km < 0.0 {
            return Err(ConfigError::Invalid {
                key: "PADIMAN_NEARBY_RADIUS_KM",
                value: nearby_radius_km.to_string(),
            });
        }

        Ok(Self {
            data_dir: lookup("PADIMAN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            pricing: PricingConfig {
                trip_rate_per_km: num("PADIMAN_TRIP_RATE_PER_KM", defaults.pricing.trip_rate_per_km)?,
                finders_fee_base: num("PADIMAN_FINDERS_FEE_BASE", defaults.pricing.finders_fee_base)?,
                finders_fee_per_km: num(
                    "PADIMAN_FINDERS_FEE_PER_KM",
                    defaults.pricing.finders_fee_per_km,
                )?,
                free_quota: num("PADIMAN_FREE_QUOTA", defaults.pricing.free_quota)?,
            },
            geo: GeoConfig {
                nearby_radius_km,
                cache_window: seconds(&lookup, "PADIMAN_GEO_CACHE_SECS", 300)?,
                profile_stale_after: seconds(&lookup, "PADIMAN_PROFILE_GEO_STALE_SECS", 86_400)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(lookup, key, default)?;
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: secs.to_string(),
        })
}
