//! Daily Money Coach
//!
//! A deterministic decision pipeline that turns raw multi-channel expense
//! signals into a prioritized daily financial micro-plan and a coaching
//! message:
//! - Normalizes SMS/manual/OCR expense input into one financial snapshot
//! - Tiers risk and enforces a SURVIVAL guardrail on HIGH risk
//! - Filters and persona-ranks a static earning-recommendation catalog
//! - Plans priority, spend limit and micro-task; composes 3-part advice
//! - Assembles one auditable, hash-verified trace per request
//!
//! An optional Gemini-backed path may rephrase the plan and advice, but it
//! is validated against the same invariants and the pipeline degrades to
//! the deterministic path on any failure.
//!
//! PIPELINE:
//! SENSE → MEMORY → RISK → VERIFY → SELECT → PLAN → COACH → TRACE

pub mod agent;
pub mod audit;
pub mod coach;
pub mod error;
pub mod gemini;
pub mod memory;
pub mod models;
pub mod observe;
pub mod persona;
pub mod planner;
pub mod risk;
pub mod sense;
pub mod verifier;

pub use error::Result;

// Re-export common types
pub use agent::CoachPipeline;
pub use models::*;
