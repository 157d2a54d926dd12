//! HTTP client module
//!
//! Provides the HTTP client shared by the catalog download and the query
//! service client.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
