//! GeoLocator - cache-aware access to the device position.
//!
//! Rules:
//! - a cached device fix younger than `cache_window` is reused unless forced;
//! - profile geo older than `profile_stale_after` is refreshed on demand;
//! - an unavailable location is `None`, never an error.

use std::sync::Arc;

use crate::config::GeoConfig;
use crate::domain::{GeoPoint, PadimanError};
use crate::persistence::{self, keys};
use crate::ports::{Clock, KvStore, LocationSource, ProfileProvider};

pub struct GeoLocator {
    source: Arc<dyn LocationSource>,
    kv: Arc<dyn KvStore>,
    profiles: Arc<dyn ProfileProvider>,
    clock: Arc<dyn Clock>,
    config: GeoConfig,
}

impl GeoLocator {
    pub fn new(
        source: Arc<dyn LocationSource>,
        kv: Arc<dyn KvStore>,
        profiles: Arc<dyn ProfileProvider>,
        clock: Arc<dyn Clock>,
        config: GeoConfig,
    ) -> Self {
        Self {
            source,
            kv,
            profiles,
            clock,
            config,
        }
    }

    /// Device position, served from cache when fresh.
    pub async fn current_position(&self, force: bool) -> Result<Option<GeoPoint>, PadimanError> {
        let now = self.clock.now();
        if !force {
            match persistence::load::<GeoPoint>(self.kv.as_ref(), keys::GEO_CACHE).await {
                Ok(Some(cached)) if now - cached.updated_at < self.config.cache_window => {
                    return Ok(Some(cached));
                }
                Ok(_) => {}
                // the cache is disposable; a bad entry is just a miss
                Err(PadimanError::CorruptRecord { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let Some(fix) = self.source.current_position().await else {
            tracing::warn!("device location unavailable");
            return Ok(None);
        };
        let fix = GeoPoint {
            updated_at: now,
            ..fix
        };
        let (key, value) = persistence::encode(keys::GEO_CACHE, &fix)?;
        self.kv.set(&key, value).await?;
        Ok(Some(fix))
    }

    /// Make sure the profile carries a reasonably fresh geo point.
    ///
    /// Returns the profile geo afterwards (possibly the old one when the
    /// device can't be located), or `None` without a profile.
    pub async fn ensure_profile_geo(&self, force: bool) -> Result<Option<GeoPoint>, PadimanError> {
        let Some(mut profile) = self.profiles.load_profile().await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let stale = profile
            .geo
            .is_none_or(|g| now - g.updated_at > self.config.profile_stale_after);

        if stale || force {
            let Some(fix) = self.current_position(force).await? else {
                return Ok(profile.geo);
            };
            profile.geo = Some(fix);
            self.profiles.save_profile(&profile).await?;
        }
        Ok(profile.geo)
    }

    /// Geo to stamp on a new task: the profile's point, else a device fix
    /// (remembered on the profile when there is one).
    pub async fn poster_geo(&self) -> Result<Option<GeoPoint>, PadimanError> {
        let profile = self.profiles.load_profile().await?;
        if let Some(geo) = profile.as_ref().and_then(|p| p.geo) {
            return Ok(Some(geo));
        }

        let Some(fix) = self.current_position(false).await? else {
            return Ok(None);
        };
        if let Some(mut profile) = profile {
            profile.geo = Some(fix);
            self.profiles.save_profile(&profile).await?;
        }
        Ok(Some(fix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Profile;
    use crate::impls::{InMemoryKvStore, KvProfileStore, StaticLocationSource};
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        kv: Arc<dyn KvStore>,
        clock: Arc<FixedClock>,
        source: Arc<StaticLocationSource>,
        profiles: Arc<KvProfileStore>,
        locator: GeoLocator,
    }

    fn fixture(fix: Option<(f64, f64)>) -> Fixture {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let source = Arc::new(StaticLocationSource::new(
            fix.map(|(lat, lon)| GeoPoint::new(lat, lon, start)),
        ));
        let profiles = Arc::new(KvProfileStore::new(
            kv.clone(),
            Arc::new(UlidGenerator::new(clock.clone())),
        ));
        let locator = GeoLocator::new(
            source.clone(),
            kv.clone(),
            profiles.clone(),
            clock.clone(),
            GeoConfig::default(),
        );
        Fixture {
            kv,
            clock,
            source,
            profiles,
            locator,
        }
    }

    #[tokio::test]
    async fn fresh_cache_is_reused() {
        let f = fixture(Some((9.08, 7.40)));
        let first = f.locator.current_position(false).await.unwrap().unwrap();

        f.source
            .set(Some(GeoPoint::new(6.52, 3.37, f.clock.now())))
            .await;
        f.clock.advance(Duration::minutes(4));

        let second = f.locator.current_position(false).await.unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn expired_cache_or_force_asks_the_device() {
        let f = fixture(Some((9.08, 7.40)));
        f.locator.current_position(false).await.unwrap();

        f.source
            .set(Some(GeoPoint::new(6.52, 3.37, f.clock.now())))
            .await;
        let forced = f.locator.current_position(true).await.unwrap().unwrap();
        assert_eq!(forced.lat, 6.52);

        f.source
            .set(Some(GeoPoint::new(9.10, 7.42, f.clock.now())))
            .await;
        f.clock.advance(Duration::minutes(6));
        let refreshed = f.locator.current_position(false).await.unwrap().unwrap();
        assert_eq!(refreshed.lat, 9.10);
        assert_eq!(refreshed.updated_at, f.clock.now());
    }

    #[tokio::test]
    async fn unavailable_location_is_none() {
        let f = fixture(None);
        assert!(f.locator.current_position(false).await.unwrap().is_none());
        assert!(f.locator.poster_geo().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_profile_geo_is_refreshed() {
        let f = fixture(Some((9.10, 7.42)));
        let old = GeoPoint::new(9.0, 7.0, f.clock.now() - Duration::hours(25));
        f.profiles
            .save_profile(&Profile {
                geo: Some(old),
                ..Profile::default()
            })
            .await
            .unwrap();

        let geo = f.locator.ensure_profile_geo(false).await.unwrap().unwrap();
        assert_eq!(geo.lat, 9.10);
        let saved = f.profiles.load_profile().await.unwrap().unwrap();
        assert_eq!(saved.geo, Some(geo));
    }

    #[tokio::test]
    async fn recent_profile_geo_is_kept() {
        let f = fixture(Some((9.10, 7.42)));
        let recent = GeoPoint::new(9.0, 7.0, f.clock.now() - Duration::hours(1));
        f.profiles
            .save_profile(&Profile {
                geo: Some(recent),
                ..Profile::default()
            })
            .await
            .unwrap();

        let geo = f.locator.ensure_profile_geo(false).await.unwrap();
        assert_eq!(geo, Some(recent));
    }

    #[tokio::test]
    async fn poster_geo_is_remembered_on_profile() {
        let f = fixture(Some((9.08, 7.40)));
        f.profiles.save_profile(&Profile::default()).await.unwrap();

        let geo = f.locator.poster_geo().await.unwrap().unwrap();
        let saved = f.profiles.load_profile().await.unwrap().unwrap();
        assert_eq!(saved.geo, Some(geo));
    }

    #[tokio::test]
    async fn refreshing_geo_keeps_other_profile_fields() {
        let f = fixture(Some((9.10, 7.42)));
        f.kv
            .set(
                keys::PROFILE,
                serde_json::json!({
                    "phone": "+234",
                    "roles": ["poster"],
                    "location": { "country": "NG", "address": "x" }
                }),
            )
            .await
            .unwrap();

        f.locator.ensure_profile_geo(false).await.unwrap();
        f.locator.poster_geo().await.unwrap();

        let raw = f.kv.get(keys::PROFILE).await.unwrap().unwrap();
        assert_eq!(raw["phone"], "+234");
        assert_eq!(raw["roles"], serde_json::json!(["poster"]));
        assert_eq!(raw["location"]["country"], "NG");
        assert_eq!(raw["location"]["address"], "x");
        assert_eq!(raw["geo"]["lat"], 9.10);
    }
}
