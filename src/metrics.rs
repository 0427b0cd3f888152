use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TokenMetrics;

/// Relative tolerance for the market-cap cross-check.
const MARKET_CAP_TOLERANCE: f64 = 0.05;

/// How a record's numeric metrics bundle is validated. The production rule
/// changed over time; both variants stay available and the choice is a
/// configuration knob, not a code branch on schema shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsPolicy {
    /// All six fields present and inside their documented ranges.
    StrictPresence,
    /// Internal consistency: market cap must agree with
    /// price x circulating supply within 5%.
    CrossConsistency,
}

impl MetricsPolicy {
    pub fn from_env_name(name: Option<&str>) -> Self {
        match name.map(|n| n.to_lowercase()).as_deref() {
            Some("cross_consistency") | Some("cross-consistency") => {
                MetricsPolicy::CrossConsistency
            }
            _ => MetricsPolicy::StrictPresence,
        }
    }

    /// Validate a metrics bundle. Missing or ill-shaped fields score 0.0;
    /// this never panics and never returns an error.
    pub fn validate(&self, metrics: Option<&TokenMetrics>) -> f64 {
        let Some(m) = metrics else {
            return 0.0;
        };
        let passed = match self {
            MetricsPolicy::StrictPresence => Self::strict_presence(m),
            MetricsPolicy::CrossConsistency => Self::cross_consistency(m),
        };
        if !passed {
            debug!("metrics validation failed under {:?}: {:?}", self, m);
        }
        if passed {
            1.0
        } else {
            0.0
        }
    }

    fn strict_presence(m: &TokenMetrics) -> bool {
        let (Some(price), Some(market_cap), Some(volume), Some(supply), Some(vol), Some(risk)) = (
            m.price,
            m.market_cap,
            m.volume_24h,
            m.circulating_supply,
            m.volatility_24h,
            m.risk_score,
        ) else {
            return false;
        };
        price > 0.0
            && market_cap > 0.0
            && volume > 0.0
            && supply > 0.0
            && (0.0..=100.0).contains(&vol)
            && (1.0..=10.0).contains(&risk)
    }

    fn cross_consistency(m: &TokenMetrics) -> bool {
        let price = m.price.unwrap_or(0.0);
        let market_cap = m.market_cap.unwrap_or(0.0);
        let supply = m.circulating_supply.unwrap_or(0.0);
        let volatility = m.volatility_24h.unwrap_or(0.0);

        if volatility > 100.0 {
            return false;
        }
        if supply > 0.0 {
            let implied = price * supply;
            if implied == 0.0 {
                return market_cap == 0.0;
            }
            ((market_cap - implied) / implied).abs() <= MARKET_CAP_TOLERANCE
        } else {
            market_cap == 0.0
        }
    }
}
