//! HTTP API handlers for menulens-api

pub mod auth;
pub mod health;
pub mod images;
pub mod menu;
pub mod presign;
pub mod recommend;
pub mod reviews;

pub use health::health_routes;
pub use images::images_routes;
pub use menu::menu_routes;
pub use presign::presign_routes;
pub use recommend::recommend_routes;
pub use reviews::reviews_routes;
