pub mod auth;
pub mod cart;
pub mod favorites;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod product_images;
pub mod products;
pub mod reviews;
pub mod users;
