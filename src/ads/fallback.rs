//! Substitute values used when a dependency call fails.
//!
//! Fallbacks live only for the request that needed them; nothing is cached.

use crate::ads::types::{BidResponse, UserAnalytics};

pub const FALLBACK_CLICK_RATE: f64 = 0.02;
pub const FALLBACK_CONVERSION_RATE: f64 = 0.01;
pub const FALLBACK_TOTAL_IMPRESSIONS: u64 = 100;

pub const FALLBACK_BID_AMOUNT: f64 = 0.50;
pub const FALLBACK_BID_ID: &str = "default_bid";
pub const FALLBACK_STRATEGY: &str = "fallback";

/// Analytics substitute for `user_id`.
pub fn fallback_analytics(user_id: &str) -> UserAnalytics {
    UserAnalytics {
        user_id: user_id.to_string(),
        click_rate: FALLBACK_CLICK_RATE,
        conversion_rate: FALLBACK_CONVERSION_RATE,
        total_impressions: FALLBACK_TOTAL_IMPRESSIONS,
    }
}

/// Bid substitute.
pub fn fallback_bid() -> BidResponse {
    BidResponse {
        bid_amount: FALLBACK_BID_AMOUNT,
        bid_id: FALLBACK_BID_ID.to_string(),
        strategy: FALLBACK_STRATEGY.to_string(),
    }
}
