//! Optional ML scoring of applications through external model services.

pub mod client;
pub mod contracts;
pub mod router;
pub mod service;

pub use client::{HttpScoringClient, ScoringClient, ScoringError};
pub use contracts::{FraudAssessment, FraudReport, PriorityPrediction};
pub use router::scoring_router;
pub use service::{ApplicationInsights, ModelOutcome, ScoredApplication, ScoringService};
