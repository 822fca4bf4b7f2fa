//! Static ad inventory served by `GET /ads`.

use crate::ads::types::AdDescriptor;

const CATALOG: [(&str, &str, &str, f64); 3] = [
    ("ad_001", "banner", "Summer Sale", 0.50),
    ("ad_002", "video", "New Product", 1.20),
    ("ad_003", "native", "Special Offer", 0.75),
];

/// All ads in the listing, in catalog order.
pub fn list_ads() -> Vec<AdDescriptor> {
    CATALOG
        .iter()
        .map(|(id, ad_type, title, price)| AdDescriptor {
            id: id.to_string(),
            ad_type: ad_type.to_string(),
            title: title.to_string(),
            price: *price,
        })
        .collect()
}
