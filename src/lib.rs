//! Order lifecycle service for a static storefront: creates orders and
//! payment checkouts, and confirms payments from gateway notifications.
//! Order records live as JSON files in a Git repository.

pub mod config;
pub mod dto;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod response;
pub mod routes;
pub mod services;
pub mod signature;
pub mod state;
pub mod store;
