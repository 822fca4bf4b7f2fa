//! Request, dependency and response payloads.

use serde::{Deserialize, Serialize};

/// Inbound ad request, also forwarded verbatim to the bidding service.
///
/// Missing fields decode as empty strings; only malformed JSON is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdRequest {
    pub user_id: String,
    pub ad_type: String,
    /// Opaque caller-supplied timestamp.
    pub timestamp: String,
}

/// Per-user engagement figures from the analytics service.
///
/// Fields the service leaves out decode as zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAnalytics {
    pub user_id: String,
    pub click_rate: f64,
    pub conversion_rate: f64,
    pub total_impressions: u64,
}

/// Bid returned by the bidding service. Missing fields decode as zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidResponse {
    pub bid_amount: f64,
    pub bid_id: String,
    /// Free-form label, `"fallback"` when the default bid was used.
    pub strategy: String,
}

/// Composed response returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdResponse {
    pub ad_id: String,
    pub ad_type: String,
    pub bid_amount: f64,
    pub user_data: String,
    pub message: String,
}

/// Entry of the static ad listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub ad_type: String,
    pub title: String,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_missing_fields_default_to_empty() {
        let request: AdRequest = serde_json::from_str(r#"{"user_id":"u1","ad_type":"banner"}"#).unwrap();
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.timestamp, "");
    }

    #[test]
    fn test_wrong_field_type_is_still_an_error() {
        assert!(serde_json::from_str::<UserAnalytics>(r#"{"click_rate":"high"}"#).is_err());
        assert!(serde_json::from_str::<BidResponse>(r#"{"bid_amount":null}"#).is_err());
    }
}
