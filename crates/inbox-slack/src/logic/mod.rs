//! Logic module for the Slack inbox adapter
//!
//! Contains:
//! - SlackClient for making HTTP requests to Slack API
//! - SlackPlatform, the inbox platform capabilities over the client
//! - Block Kit rendering of notifications

pub mod blocks;
mod client;
mod platform;

pub use client::{SlackClient, SlackClientError};
pub use platform::SlackPlatform;
