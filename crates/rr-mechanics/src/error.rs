//! Error types for the resolution engine.
//!
//! Failed checks, fumbles, and blocked attempts are ordinary domain
//! results, never errors. These variants cover caller misuse
//! (operating on a terminal chain, retrying a non-retryable step) and
//! missing state at mutation boundaries.

use crate::chain::ChainStatus;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the resolution engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A cooperative check was invoked with no participants.
    #[error("cooperative check requires at least one participant")]
    NoParticipants,

    /// A chain was started with an empty step list.
    #[error("chain '{0}' requires at least one step")]
    EmptyChain(String),

    /// The requested chain does not exist in the repository.
    #[error("chain not found: {0}")]
    ChainNotFound(String),

    /// A mutating operation was attempted on a terminal chain.
    #[error("chain {check_id} is {status}, not in progress")]
    ChainNotActive {
        /// The chain identifier.
        check_id: String,
        /// The terminal status the chain is in.
        status: ChainStatus,
    },

    /// The current step failed softly and is waiting on a retry or
    /// abandon decision; `process_step` cannot run again until then.
    #[error("chain {0}: current step awaits a retry or abandon decision")]
    AwaitingRetry(String),

    /// A retry was requested on a step that does not permit one.
    #[error("chain {check_id}: step {step} cannot be retried ({reason})")]
    RetryNotAllowed {
        /// The chain identifier.
        check_id: String,
        /// Index of the step the retry targeted.
        step: usize,
        /// Why the retry is not permitted.
        reason: String,
    },

    /// An extended check was started with a zero success target or a
    /// zero round limit.
    #[error("extended check '{0}' requires a positive success target and round limit")]
    InvalidExtendedCheck(String),

    /// A round was rolled against a terminal extended check.
    #[error("extended check {check_id} is {status}, not in progress")]
    ExtendedCheckInactive {
        /// The extended check identifier.
        check_id: String,
        /// The terminal status the check is in.
        status: ChainStatus,
    },

    /// The requested consequence does not exist in the store.
    #[error("consequence not found: {0}")]
    ConsequenceNotFound(String),
}
