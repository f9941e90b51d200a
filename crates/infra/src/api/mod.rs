//! Remote API clients for DisTrack
//!
//! # Architecture
//!
//! - [`BaseUrlResolver`] finds the service URL once per process
//! - [`HttpClient`](crate::http::HttpClient) is the shared transport
//! - [`AuthApi`] and [`LinkClient`] call unauthenticated endpoints
//! - [`ApiClient`] adds the bearer header with refresh-and-retry-once on 401;
//!   [`SessionsApi`] and [`AccountApi`] sit on top of it
//!
//! Structured tracing only; tokens never appear in log fields.

pub mod account;
pub mod auth;
pub mod base_url;
pub mod client;
pub mod errors;
pub mod link;
pub mod sessions;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use base_url::{BaseUrlResolver, BASE_URL_ENV};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, RequestOptions};
pub use errors::{ApiError, ApiErrorCategory};
pub use link::{LinkClient, LinkError, LinkPoll, LinkSession};
pub use reqwest::Method;
pub use sessions::SessionsApi;
