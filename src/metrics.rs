//! Prometheus metrics collection
//!
//! Tracks request counts by endpoint and outcome, plus a dedicated
//! counter for fallback responses so operators can see degraded service
//! even though every response still returns 200.
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::inference::TaskKind;

/// Request outcome for the `outcome` metric label.
///
/// Restricting values to an enum keeps cardinality at
/// 2 endpoints x 3 outcomes = 6 time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Model output was parsed and returned.
    Success,
    /// A canned response was served instead of model output.
    Fallback,
    /// The request failed validation (client error).
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Fallback => "fallback",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Why a fallback response was served, for the `reason` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Every upstream attempt failed.
    UpstreamExhausted,
    /// The model answered but its output could not be parsed.
    UnusableOutput,
    /// The request body could not be read as JSON.
    BadRequestBody,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::UpstreamExhausted => "upstream_exhausted",
            FallbackReason::UnusableOutput => "unusable_output",
            FallbackReason::BadRequestBody => "bad_request_body",
        }
    }
}

/// Metrics collector shared across handlers.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    fallback_total: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with its own registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "agrovisor_requests_total",
                "Total API requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )?;

        let fallback_total = IntCounterVec::new(
            Opts::new(
                "agrovisor_fallback_total",
                "Total fallback responses served by endpoint and reason",
            ),
            &["endpoint", "reason"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(fallback_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            fallback_total,
        })
    }

    /// Record a completed request.
    pub fn record_request(&self, endpoint: TaskKind, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[endpoint.as_str(), outcome.as_str()])
            .inc();
    }

    /// Record a fallback response and why it was served.
    pub fn record_fallback(&self, endpoint: TaskKind, reason: FallbackReason) {
        self.fallback_total
            .with_label_values(&[endpoint.as_str(), reason.as_str()])
            .inc();
    }

    /// Gather all metrics and encode them in Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            tracing::error!(error = %e, "Prometheus encoder produced invalid UTF-8");
            prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {e}"))
        })
    }
}
