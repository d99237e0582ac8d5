//! gamdl Bootstrap Library
//!
//! Startup supervisor for the gamdl Telegram bot container.
//!
//! This crate provides the core functionality for:
//! - Reading the runtime configuration from the environment
//! - Preparing the directory layout and validating the bot token
//! - Clearing stale scratch directories left by earlier runs
//! - Handing control to the worker process

pub mod bootstrap;
pub mod config;
pub mod handoff;
pub mod logging;
