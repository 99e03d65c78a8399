//! # Conclave Core
//!
//! The top of the stack: a long-lived engine that owns the supervisor
//! registry, runs debates as spawned tasks, applies the post-decision
//! performance update, and feeds every finished record to an audit sink.
//!
//! ```no_run
//! use conclave_core::{CouncilEngine, EngineConfig, Proposal};
//! # use std::sync::Arc;
//! # async fn demo(backend: Arc<dyn conclave_core::ModelBackend>) -> Result<(), conclave_core::EngineError> {
//! let engine = CouncilEngine::new(EngineConfig::default())?;
//! engine.register_backend("reviewer-1", &["backend"], 1.0, backend)?;
//!
//! let id = engine.start_debate(Proposal::new("add rate limiting").with_file("src/api/limit.rs"))?;
//! let record = engine.await_decision(id).await?;
//! println!("{}: {}", record.id, record.decision.outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::{DebateConfig, EngineConfig, RetryConfig};
pub use engine::{AuditSink, CouncilEngine, DebateStatus, TracingSink};
pub use error::EngineError;

// The surface callers need to drive debates without naming inner crates.
pub use conclave_council::{
    ConsensusConfig, ConsensusMode, DebateOptions, DebateRecord, Decision, Outcome, VetoOverride,
};
pub use conclave_panel::{
    BackendError, BackendReply, Confidence, ModelBackend, PerformanceRecord, Proposal, Verdict,
};
