//! Ordering recommendation structures
//!
//! Shape of the advisor model's structured output contract.

use serde::{Deserialize, Serialize};

/// Quantities for the ordering plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingPlan {
    pub shareables: u32,
    pub mains: u32,
    pub dessert: u32,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// One recommended dish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub dish: String,
    /// "shareable" | "main" | "dessert"
    pub category: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_whom: Option<String>,
}

/// One dish to skip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidItem {
    pub dish: String,
    pub reason: String,
}

/// Complete recommendation payload, cached per (run, preference hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub plan: OrderingPlan,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub avoid: Vec<AvoidItem>,
}
