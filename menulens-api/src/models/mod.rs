//! Data models for menulens-api
//!
//! - Run lifecycle state machine
//! - Extracted menu structure
//! - Recommendation preferences and results
//! - Review mention results

pub mod menu;
pub mod preferences;
pub mod recommendation;
pub mod review;
pub mod run;

pub use menu::{Dish, Menu, MenuSection};
pub use preferences::{Adventurousness, Budget, PreferenceProfile, Vibe};
pub use recommendation::{AvoidItem, OrderingPlan, Recommendation, RecommendationSet};
pub use review::{DishMention, ReviewMentionResult};
pub use run::{Run, RunStatus};
