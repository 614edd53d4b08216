//! # Interceptor Contract
//!
//! The capability every pluggable stanza interceptor implements.
//!
//! ## Two-phase invocation
//!
//! For each stanza an interceptor is invoked twice: once before the stanza
//! is processed (`Phase::Pre`) and, unless the stanza was rejected, once
//! after it was handed to the router or the wire (`Phase::Post`). Both calls
//! see the same direction and the same, possibly mutated, stanza.
//!
//! Only a `Pre` invocation may reject. A rejection returned from `Post` is
//! logged by the dispatcher and otherwise ignored.
//!
//! ```rust,ignore
//! struct DenyAll;
//!
//! impl StanzaInterceptor for DenyAll {
//!     fn intercept(&self, _: &mut Stanza, _: &SessionInfo, _: Direction, phase: Phase) -> InterceptResult {
//!         match phase {
//!             Phase::Pre => InterceptResult::reject("denied"),
//!             Phase::Post => InterceptResult::Accepted,
//!         }
//!     }
//! }
//! ```

use std::fmt;

use crate::entities::{Direction, SessionInfo};
use crate::stanza::{Stanza, StanzaErrorCondition};

/// Which of the two invocations is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before processing (`processed == false`).
    Pre,
    /// After processing (`processed == true`).
    Post,
}

impl Phase {
    pub fn is_processed(self) -> bool {
        matches!(self, Phase::Post)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pre => f.write_str("pre"),
            Phase::Post => f.write_str("post"),
        }
    }
}

/// Which phases an interceptor wants to be called for.
///
/// The default is both; narrowing it only skips calls the interceptor
/// would have ignored anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseFilter {
    PreOnly,
    PostOnly,
    #[default]
    Both,
}

impl PhaseFilter {
    pub fn includes(self, phase: Phase) -> bool {
        match (self, phase) {
            (PhaseFilter::Both, _) => true,
            (PhaseFilter::PreOnly, Phase::Pre) => true,
            (PhaseFilter::PostOnly, Phase::Post) => true,
            _ => false,
        }
    }
}

/// A deliberate refusal to let a stanza through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    reason: String,
    condition: Option<StanzaErrorCondition>,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: StanzaErrorCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn condition(&self) -> Option<StanzaErrorCondition> {
        self.condition
    }

    /// The condition to put in an error reply.
    pub fn condition_or_default(&self) -> StanzaErrorCondition {
        self.condition.unwrap_or(StanzaErrorCondition::NotAllowed)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            Some(c) => write!(f, "{} ({})", self.reason, c.as_str()),
            None => f.write_str(&self.reason),
        }
    }
}

/// Outcome of one interceptor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum InterceptResult {
    Accepted,
    Rejected(Rejection),
}

impl InterceptResult {
    pub fn reject(reason: impl Into<String>) -> Self {
        InterceptResult::Rejected(Rejection::new(reason))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, InterceptResult::Rejected(_))
    }
}

/// A pluggable unit of logic invoked around stanza processing.
///
/// Implementations run synchronously on the session's thread and must be
/// fast. They may mutate the stanza's extension tree and must not keep a
/// reference to it past the call.
pub trait StanzaInterceptor: Send + Sync {
    fn intercept(
        &self,
        stanza: &mut Stanza,
        session: &SessionInfo,
        direction: Direction,
        phase: Phase,
    ) -> InterceptResult;

    /// Phases this interceptor cares about.
    fn phases(&self) -> PhaseFilter {
        PhaseFilter::Both
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
