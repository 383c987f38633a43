//! # warden-api
//!
//! REST client for the Warden backend: authentication, conversation listing
//! and creation, message listing and sending. Every call is JSON over HTTPS
//! with a bearer token attached whenever one is held.
//!
//! The [`AuthApi`] and [`ChatApi`] traits are the seams the client core is
//! generic over; [`ApiClient`] is the reqwest-backed production
//! implementation.

pub mod client;
pub mod config;
pub mod dto;

mod error;

pub use client::{ApiClient, AuthApi, ChatApi};
pub use config::ApiConfig;
pub use dto::{LoginResponse, Page};
pub use error::{ApiError, ApiResult};
