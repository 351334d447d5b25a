//! Venue ticketing configuration
//!
//! One venue-configured set of constants shared by issuance (terminal
//! side) and redemption (gate side), so the combo arithmetic and the
//! expiry calendar can never drift apart between surfaces.

use chrono_tz::Tz;

/// Coupons issued per combo unit
pub const DEFAULT_COMBO_MULTIPLIER: u32 = 6;
/// Face value of one combo coupon, in whole rupees
pub const DEFAULT_COUPON_FACE_VALUE: i64 = 100;
/// Expiry is by calendar day in this zone
pub const DEFAULT_VENUE_TIMEZONE: &str = "Asia/Kolkata";

/// Venue-configured ticketing constants.
///
/// All values can be overridden through environment variables:
///
/// | Env var | Default |
/// |---------|---------|
/// | COMBO_MULTIPLIER | 6 |
/// | COUPON_FACE_VALUE | 100 |
/// | VENUE_TIMEZONE | Asia/Kolkata |
#[derive(Debug, Clone, Copy)]
pub struct TicketingConfig {
    /// Sub-coupons issued per combo unit sold
    pub combo_multiplier: u32,
    /// Face value printed on each combo coupon (whole rupees). Deliberately
    /// independent of the combo's purchase price: the combo buys bulk
    /// entries at a discounted implied per-ride rate.
    pub coupon_face_value: i64,
    /// Venue timezone; same-day expiry is a calendar-date comparison in
    /// this zone, not a rolling 24h window.
    pub timezone: Tz,
}

impl TicketingConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            combo_multiplier: std::env::var("COMBO_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.combo_multiplier),
            coupon_face_value: std::env::var("COUPON_FACE_VALUE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.coupon_face_value),
            timezone: match std::env::var("VENUE_TIMEZONE") {
                Ok(name) => name.parse().unwrap_or_else(|e| {
                    tracing::warn!(
                        "Invalid VENUE_TIMEZONE '{name}': {e}, falling back to {DEFAULT_VENUE_TIMEZONE}"
                    );
                    defaults.timezone
                }),
                Err(_) => defaults.timezone,
            },
        }
    }
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            combo_multiplier: DEFAULT_COMBO_MULTIPLIER,
            coupon_face_value: DEFAULT_COUPON_FACE_VALUE,
            timezone: DEFAULT_VENUE_TIMEZONE
                .parse()
                .expect("default venue timezone is a valid tz name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_venue_reference_values() {
        let cfg = TicketingConfig::default();
        assert_eq!(cfg.combo_multiplier, 6);
        assert_eq!(cfg.coupon_face_value, 100);
        assert_eq!(cfg.timezone.name(), "Asia/Kolkata");
    }
}
