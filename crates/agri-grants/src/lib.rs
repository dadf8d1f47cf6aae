//! Grant catalog, application lifecycle, market prices and scoring
//! integration for the agricultural grant portal.

pub mod auth;
pub mod config;
pub mod error;
pub mod scoring;
pub mod seed;
pub mod storage;
pub mod telemetry;
pub mod workflows;
