//! # Conclave Panel
//!
//! Supervisor capability layer for the Conclave council engine.
//!
//! A *supervisor* is one independent judge: a model/provider pair that can
//! be asked to evaluate a [`Proposal`] and answer with a structured
//! [`Verdict`]. This crate provides:
//!
//! - the [`ModelBackend`] capability trait (one implementation per provider,
//!   opaque to the rest of the engine),
//! - the [`Supervisor`] wrapper that owns retry/backoff and call statistics,
//! - the [`SupervisorRegistry`] holding registered supervisors, their base
//!   weights, and rolling performance records.
//!
//! ## Failure model
//!
//! A well-formed verdict is never a failure, even a rejection. Transient
//! provider errors are retried locally with exponential backoff; exceeding
//! the retry budget or the caller's deadline yields an [`EvalError`], which
//! callers treat as an abstention for that round, never as a vote either
//! way.
//!
//! ## Mutation discipline
//!
//! Registry weights and performance records are mutated only by the council
//! manager's post-debate step, single-writer. Everything read during a
//! debate comes from an immutable [`SupervisorSnapshot`] taken up front.

pub mod backend;
pub mod error;
pub mod proposal;
pub mod registry;
pub mod supervisor;
pub mod verdict;

pub use backend::{BackendError, BackendReply, ModelBackend};
pub use error::{EvalError, PanelError};
pub use proposal::Proposal;
pub use registry::{PerformanceRecord, SupervisorRegistry, SupervisorSnapshot};
pub use supervisor::{RetryPolicy, Supervisor};
pub use verdict::{Confidence, Verdict};

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
