//! Agrovisor - Crop advisory API with resilient external inference
//!
//! This library serves plant disease detection and crop recommendation
//! endpoints backed by the Gemini API. Upstream calls are retried with
//! exponential backoff, model output is parsed strictly, and every
//! failure path degrades to a deterministic, schema-valid fallback.

pub mod advisory;
pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod inference;
pub mod metrics;
pub mod middleware;
pub mod retry;
pub mod telemetry;
