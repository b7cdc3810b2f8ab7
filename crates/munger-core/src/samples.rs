//! Built-in example purchases
//!
//! A small catalog covering each recommendation band, handy for demos and for
//! smoke-testing a backend end to end.

use serde::Serialize;

use crate::error::Result;
use crate::models::PurchaseRequest;

/// One example purchase with the score band it usually lands in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePurchase {
    pub title: &'static str,
    pub item: &'static str,
    pub cost: f64,
    pub description: &'static str,
    pub likely_score: &'static str,
}

impl SamplePurchase {
    /// Request for this sample, with its description passed along as notes
    pub fn request(&self) -> Result<PurchaseRequest> {
        Ok(PurchaseRequest::new(self.item, self.cost)?.with_extra_context(self.description))
    }
}

static SAMPLES: [SamplePurchase; 4] = [
    SamplePurchase {
        title: "Essential Professional Upgrade",
        item: "High-Performance Laptop",
        cost: 1200.0,
        description: "A powerful laptop for a professional who needs it for work",
        likely_score: "High (5+)",
    },
    SamplePurchase {
        title: "Luxury Purchase",
        item: "Designer Watch",
        cost: 5000.0,
        description: "An expensive luxury watch as a status symbol",
        likely_score: "Low (Negative)",
    },
    SamplePurchase {
        title: "Home Investment",
        item: "Quality Mattress",
        cost: 800.0,
        description: "A high-quality mattress to improve sleep and health",
        likely_score: "High (5+)",
    },
    SamplePurchase {
        title: "Impulse Purchase",
        item: "Latest Smartphone",
        cost: 1000.0,
        description: "Upgrading to the newest smartphone when current one works fine",
        likely_score: "Medium (0-4)",
    },
];

/// The example catalog, in display order
pub fn sample_purchases() -> &'static [SamplePurchase] {
    &SAMPLES
}

/// Look up a sample by item name (case-insensitive)
pub fn find_sample(item: &str) -> Option<&'static SamplePurchase> {
    SAMPLES.iter().find(|s| s.item.eq_ignore_ascii_case(item.trim()))
}
