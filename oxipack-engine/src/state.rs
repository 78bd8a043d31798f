//! Request lifecycle.

use oxipack_core::error::{ErrorKind, PackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a compression request is in its lifecycle.
///
/// ```text
/// Pending -> Analyzing -> Encoding -> Finalizing -> Complete
///    \___________\____________\____________\______-> Failed(kind)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum RequestState {
    /// Accepted, no work done yet.
    Pending,
    /// Validating the request and measuring its input.
    Analyzing,
    /// Running the codec or container pipeline.
    Encoding,
    /// Naming the result and publishing it to the store.
    Finalizing,
    /// Result is retrievable.
    Complete,
    /// Stopped with the given error kind; nothing was published.
    Failed(ErrorKind),
}

impl RequestState {
    /// Stable name, also used in job status responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Encoding => "encoding",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
            Self::Failed(_) => "failed",
        }
    }

    /// `Complete` and `Failed` are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, Self::Failed(_)) => true,
            (Self::Pending, Self::Analyzing)
            | (Self::Analyzing, Self::Encoding)
            | (Self::Encoding, Self::Finalizing)
            | (Self::Finalizing, Self::Complete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "failed ({kind})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Tracks one request's state and rejects out-of-order transitions.
#[derive(Debug)]
pub struct StateMachine {
    state: RequestState,
}

impl StateMachine {
    /// Start in [`RequestState::Pending`].
    pub fn new() -> Self {
        Self {
            state: RequestState::Pending,
        }
    }

    /// Current state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Move to `next`.
    pub fn transition(&mut self, next: RequestState) -> Result<RequestState> {
        if !self.state.can_transition_to(&next) {
            return Err(PackError::encoding_failure(format!(
                "invalid state transition {} -> {}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(next)
    }

    /// Move to `Failed(kind)` unless already terminal.
    ///
    /// Returns the new state, or `None` if the request had already finished.
    pub fn fail(&mut self, kind: ErrorKind) -> Option<RequestState> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = RequestState::Failed(kind);
        Some(self.state)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
