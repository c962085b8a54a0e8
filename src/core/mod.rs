//! Core modules for arbiter0

pub mod api;
pub mod config;
pub mod floors;
pub mod lane;
pub mod ledger;
pub mod mcp;
pub mod merkle;
pub mod metrics;
pub mod pipeline;
pub mod ratelimit;
pub mod store;
pub mod verdict;

pub use api::{create_router, run_server};
pub use config::{Config, ConfigError};
pub use floors::{EvalContext, FloorEvaluators, Scorer, ScorerError};
pub use lane::LaneClassifier;
pub use ledger::{Ledger, LedgerError};
pub use merkle::{canonical_json, record_hash, sha256_hex, SealLeaves};
pub use metrics::{Metrics, MetricsSnapshot};
pub use pipeline::{
    CheckpointOutcome, DecideRequest, InitRequest, Pipeline, ProposeRequest, Refusal, SealRequest,
    StageRequest,
};
pub use ratelimit::{classify_authority, RateLimiter};
pub use store::{ExternalKv, SessionStore, StoreError};
pub use verdict::{p_truth, resolve, Resolution};
