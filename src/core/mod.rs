// src/core/mod.rs

/// Data structures shared by the probes, the aggregator and the report.
pub mod models;

pub mod error;

/// Network probes and pure analyzers.
pub mod scanner;

/// Severity policy and deterministic finding order.
pub mod aggregator;

/// Remediation advice keyed by finding subject.
pub mod knowledge_base;
