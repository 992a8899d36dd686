//! Pricing - finders fee, trip cost and the poster's free quota.

use crate::config::PricingConfig;
use crate::domain::Naira;

#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    config: PricingConfig,
}

impl Pricing {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `max(0, round(base + per_km * d))`
    pub fn finders_fee(&self, distance_km: f64) -> Naira {
        finders_fee(
            distance_km,
            self.config.finders_fee_base,
            self.config.finders_fee_per_km,
        )
    }

    /// `max(0, round(d * rate))`
    pub fn trip_cost(&self, distance_km: f64) -> Naira {
        trip_cost(distance_km, self.config.trip_rate_per_km)
    }

    /// The `nth` post (1-based) falls inside the free quota.
    pub fn is_free_post(&self, nth: u64) -> bool {
        nth <= self.config.free_quota
    }

    /// A finders fee is owed once the poster is past the free quota, the
    /// fee hasn't been paid for this task, and there is something to pay.
    pub fn finders_fee_required(&self, post_count: u64, already_paid: bool, fee: Naira) -> bool {
        post_count > self.config.free_quota && !already_paid && !fee.is_zero()
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

pub fn finders_fee(distance_km: f64, base: u64, per_km: u64) -> Naira {
    round_naira(base as f64 + per_km as f64 * sanitize(distance_km))
}

pub fn trip_cost(distance_km: f64, rate_per_km: u64) -> Naira {
    round_naira(sanitize(distance_km) * rate_per_km as f64)
}

fn sanitize(distance_km: f64) -> f64 {
    if distance_km.is_finite() { distance_km } else { 0.0 }
}

fn round_naira(value: f64) -> Naira {
    // `as` saturates, and negatives were clamped to zero already
    Naira::new(value.round().max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 50)]
    #[case(1.0, 100)]
    #[case(2.9, 195)]
    #[case(3.2, 210)]
    #[case(-5.0, 0)]
    #[case(f64::NAN, 50)]
    fn finders_fee_table(#[case] km: f64, #[case] expected: u64) {
        assert_eq!(Pricing::default().finders_fee(km), Naira::new(expected));
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(2.97, 594)]
    #[case(3.125, 625)]
    #[case(0.0024, 0)]
    #[case(0.004, 1)]
    #[case(f64::INFINITY, 0)]
    fn trip_cost_table(#[case] km: f64, #[case] expected: u64) {
        assert_eq!(Pricing::default().trip_cost(km), Naira::new(expected));
    }

    #[rstest]
    #[case(1, true)]
    #[case(2, true)]
    #[case(3, false)]
    fn free_quota(#[case] nth: u64, #[case] free: bool) {
        assert_eq!(Pricing::default().is_free_post(nth), free);
    }

    #[rstest]
    #[case::inside_quota(2, false, 150, false)]
    #[case::past_quota(3, false, 150, true)]
    #[case::already_paid(3, true, 150, false)]
    #[case::nothing_to_pay(3, false, 0, false)]
    fn finders_fee_rule(
        #[case] post_count: u64,
        #[case] paid: bool,
        #[case] fee: u64,
        #[case] required: bool,
    ) {
        assert_eq!(
            Pricing::default().finders_fee_required(post_count, paid, Naira::new(fee)),
            required
        );
    }

    #[test]
    fn custom_rates_apply() {
        let pricing = Pricing::new(PricingConfig {
            trip_rate_per_km: 100,
            finders_fee_base: 0,
            finders_fee_per_km: 10,
            free_quota: 0,
        });
        assert_eq!(pricing.trip_cost(2.5), Naira::new(250));
        assert_eq!(pricing.finders_fee(2.5), Naira::new(25));
        assert!(!pricing.is_free_post(1));
    }
}
