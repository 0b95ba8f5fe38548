//! Service layer: external collaborator clients and the engines built on them

pub mod completion;
pub mod image_search;
pub mod menu_extractor;
pub mod recommender;
pub mod reviews;
pub mod search;

pub use completion::{CompletionModel, OpenAiClient};
pub use search::{SearchProvider, SerpApiClient};
