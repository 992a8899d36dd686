//! AppBuilder - wiring of the marketplace.
//!
//! Collaborators are injected; the ones with a sensible default (clock, ids,
//! profile store, event sink) are filled in at `build()`. Storage and the
//! location source have no default: `build()` fails fast and names every
//! missing one.

use std::sync::Arc;

use crate::config::Config;
use crate::geo::GeoLocator;
use crate::impls::{KvProfileStore, NoopEventSink};
use crate::matching::Pricing;
use crate::ports::{
    Clock, EventSink, IdGenerator, KvStore, LocationSource, ProfileProvider, SystemClock,
    UlidGenerator,
};
use crate::settlement::{Settlement, SettlementDeps};

/// Builds a [`Marketplace`].
///
/// ```ignore
/// let market = AppBuilder::new(Config::from_env()?)
///     .kv_store(Arc::new(JsonFileKvStore::open(&dir).await?))
///     .location_source(Arc::new(StaticLocationSource::new(fix)))
///     .build()?;
/// ```
pub struct AppBuilder {
    config: Config,
    kv: Option<Arc<dyn KvStore>>,
    location: Option<Arc<dyn LocationSource>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    profiles: Option<Arc<dyn ProfileProvider>>,
    events: Option<Arc<dyn EventSink>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing components: {0:?}")]
    MissingComponents(Vec<&'static str>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            kv: None,
            location: None,
            clock: None,
            ids: None,
            profiles: None,
            events: None,
        }
    }

    pub fn kv_store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn location_source(mut self, location: Arc<dyn LocationSource>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn profiles(mut self, profiles: Arc<dyn ProfileProvider>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<Marketplace, BuildError> {
        let mut missing = Vec::new();
        if self.kv.is_none() {
            missing.push("kv_store");
        }
        if self.location.is_none() {
            missing.push("location_source");
        }
        let (Some(kv), Some(location)) = (self.kv, self.location) else {
            return Err(BuildError::MissingComponents(missing));
        };

        let radius = self.config.geo.nearby_radius_km;
        if !radius.is_finite() || radius < 0.0 {
            return Err(BuildError::InvalidConfig(format!(
                "nearby radius must be a non-negative number, got {radius}"
            )));
        }
        if self.config.geo.cache_window < chrono::Duration::zero()
            || self.config.geo.profile_stale_after < chrono::Duration::zero()
        {
            return Err(BuildError::InvalidConfig("geo windows must not be negative".into()));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let profiles = self
            .profiles
            .unwrap_or_else(|| Arc::new(KvProfileStore::new(kv.clone(), ids.clone())));
        let events = self.events.unwrap_or_else(|| Arc::new(NoopEventSink));

        let locator = Arc::new(GeoLocator::new(
            location,
            kv.clone(),
            profiles.clone(),
            clock.clone(),
            self.config.geo.clone(),
        ));
        let settlement = Settlement::new(SettlementDeps {
            kv,
            profiles: profiles.clone(),
            locator: locator.clone(),
            clock,
            ids,
            events,
            pricing: Pricing::new(self.config.pricing.clone()),
            nearby_radius_km: radius,
        });

        tracing::debug!(
            free_quota = self.config.pricing.free_quota,
            nearby_radius_km = radius,
            "marketplace wired"
        );
        Ok(Marketplace {
            settlement,
            locator,
            profiles,
            config: self.config,
        })
    }
}

/// Everything the presentation layer talks to, built once and passed by
/// reference.
pub struct Marketplace {
    settlement: Settlement,
    locator: Arc<GeoLocator>,
    profiles: Arc<dyn ProfileProvider>,
    config: Config,
}

impl Marketplace {
    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    pub fn locator(&self) -> &GeoLocator {
        &self.locator
    }

    pub fn profiles(&self) -> &dyn ProfileProvider {
        self.profiles.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, Naira};
    use crate::impls::{InMemoryKvStore, StaticLocationSource};
    use chrono::Utc;

    fn location() -> Arc<dyn LocationSource> {
        Arc::new(StaticLocationSource::new(Some(GeoPoint::new(
            9.08,
            7.40,
            Utc::now(),
        ))))
    }

    #[test]
    fn build_reports_every_missing_component() {
        let err = AppBuilder::new(Config::default()).build().err().unwrap();
        assert!(matches!(
            err,
            BuildError::MissingComponents(ref missing) if missing == &vec!["kv_store", "location_source"]
        ));
    }

    #[test]
    fn build_rejects_negative_radius() {
        let mut config = Config::default();
        config.geo.nearby_radius_km = -1.0;
        let err = AppBuilder::new(config)
            .kv_store(Arc::new(InMemoryKvStore::new()))
            .location_source(location())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn built_marketplace_is_usable() {
        let market = AppBuilder::new(Config::default())
            .kv_store(Arc::new(InMemoryKvStore::new()))
            .location_source(location())
            .build()
            .unwrap();

        let balances = market.settlement().deposit(Naira::new(1_000)).await.unwrap();
        assert_eq!(balances.wallet_balance, Naira::new(1_000));
        assert!(market.locator().current_position(false).await.unwrap().is_some());
        assert_eq!(market.config().pricing.free_quota, 2);
    }
}
