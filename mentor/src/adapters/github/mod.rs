//! GitHub adapter
//!
//! Implementation of the GitHub REST API client.

pub mod client;

pub use client::GitHubClientImpl;
