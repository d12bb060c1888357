//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check and agent configuration
//! - `calls` - Web call creation
//! - `flow` - Flow compilation preview
//! - `webhook` - Voice provider webhooks (LLM turns and call events)

pub mod api;
pub mod calls;
pub mod flow;
pub mod webhook;
