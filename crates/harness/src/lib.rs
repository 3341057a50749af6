//! IPM API contract harness
//!
//! Black-box checks for the IPM users and prediction API:
//! - Configuration from environment variables
//! - A thin HTTP client that logs in once and shares the bearer token
//! - Response assertions that report the raw body on failure
//! - The ordered end-to-end scenario, with the created subject threaded
//!   between stages as an explicit fixture

pub mod assertions;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod scenario;
pub mod telemetry;

pub use client::{ApiClient, ApiResponse, Session};
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use models::{NewSubject, Prediction, PredictionRequest, SubjectId, SubjectRecord};
pub use scenario::{
    DeletedSubject, Scenario, ScenarioFailure, ScenarioReport, Stage, SubjectFixture,
};
pub use telemetry::init_tracing;
