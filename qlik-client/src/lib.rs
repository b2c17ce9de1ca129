//! Qlik Cloud API client
//!
//! Typed models for the spaces, data connection, data integration and gateway
//! endpoints, the `QlikApi` trait the provider is written against, and
//! `QlikClient`, its HTTPS implementation.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use api::QlikApi;
pub use auth::ClientCredentials;
pub use client::QlikClient;
pub use error::{ClientError, ClientResult};
