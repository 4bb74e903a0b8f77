//! Remote submission lifecycle for a single form instance
//!
//! The machine never performs I/O. [`SubmissionMachine::begin`] hands out the
//! [`Generation`] an outbound request must carry, completions are fed back
//! through [`SubmissionMachine::complete`], and the auto-dismiss deadline is
//! driven by [`SubmissionMachine::poll`] from the host's event loop.

use crate::error::SubmitBlocked;
use std::fmt;
use std::time::{Duration, Instant};

/// Text shown when a failure carries no exception message
pub const GENERIC_FAILURE: &str = "There was an error submitting.";

/// Top-level error text for a failed submission
pub fn failure_detail(exception_message: Option<&str>) -> String {
    match exception_message {
        Some(message) if !message.is_empty() => format!("{GENERIC_FAILURE} {message}"),
        _ => GENERIC_FAILURE.to_string(),
    }
}

/// Lifecycle tag of a form instance, bumped on every reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

/// What the host does once the success display has run its course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissAction {
    /// Close the host dialog. Resubmitting after success is refused.
    CloseDialog,
    /// Hide the success indicator and return to idle
    ClearIndicator,
}

/// Effect of a completion delivered to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEffect {
    Succeeded,
    Failed(String),
    /// Belonged to an earlier lifecycle, or nothing was in flight
    Stale,
}

#[derive(Debug)]
pub struct SubmissionMachine {
    state: SubmissionState,
    generation: Generation,
    dismiss_after: Duration,
    dismiss_action: DismissAction,
    dismiss_at: Option<Instant>,
}

impl SubmissionMachine {
    pub fn new(dismiss_after: Duration, dismiss_action: DismissAction) -> Self {
        Self {
            state: SubmissionState::Idle,
            generation: Generation::default(),
            dismiss_after,
            dismiss_action,
            dismiss_at: None,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == SubmissionState::Succeeded
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failed(detail) => Some(detail),
            _ => None,
        }
    }

    /// Pending auto-dismiss deadline, if armed
    pub fn dismiss_due(&self) -> Option<Instant> {
        self.dismiss_at
    }

    /// Enter `Submitting`, returning the generation to tag the request with
    pub fn begin(&mut self) -> Result<Generation, SubmitBlocked> {
        match self.state {
            SubmissionState::Submitting => return Err(SubmitBlocked::InFlight),
            SubmissionState::Succeeded if self.dismiss_action == DismissAction::CloseDialog => {
                return Err(SubmitBlocked::Completed)
            }
            _ => {}
        }
        self.dismiss_at = None;
        self.state = SubmissionState::Submitting;
        tracing::debug!(generation = %self.generation, "submission started");
        Ok(self.generation)
    }

    /// Apply the result of the request tagged with `generation`
    ///
    /// `outcome` carries the top-level error text on failure.
    pub fn complete(
        &mut self,
        generation: Generation,
        outcome: Result<(), String>,
        now: Instant,
    ) -> CompletionEffect {
        if generation != self.generation || !self.is_submitting() {
            tracing::debug!(
                %generation,
                current = %self.generation,
                "discarding stale completion"
            );
            return CompletionEffect::Stale;
        }

        match outcome {
            Ok(()) => {
                self.state = SubmissionState::Succeeded;
                self.dismiss_at = Some(now + self.dismiss_after);
                tracing::info!(%generation, "submission succeeded");
                CompletionEffect::Succeeded
            }
            Err(detail) => {
                tracing::warn!(%generation, %detail, "submission failed");
                self.state = SubmissionState::Failed(detail.clone());
                CompletionEffect::Failed(detail)
            }
        }
    }

    /// Fire the auto-dismiss deadline if it has passed
    ///
    /// Yields the dismiss action at most once per success.
    pub fn poll(&mut self, now: Instant) -> Option<DismissAction> {
        let due = self.dismiss_at?;
        if now < due {
            return None;
        }
        self.dismiss_at = None;
        self.state = SubmissionState::Idle;
        tracing::debug!(
            generation = %self.generation,
            action = ?self.dismiss_action,
            "dismiss timer fired"
        );
        Some(self.dismiss_action)
    }

    /// Drop a showing outcome early: a success and its timer, or a failure
    pub fn acknowledge(&mut self) {
        if matches!(
            self.state,
            SubmissionState::Succeeded | SubmissionState::Failed(_)
        ) {
            self.state = SubmissionState::Idle;
            self.dismiss_at = None;
        }
    }

    /// Start a new lifecycle: idle, timer cancelled, older responses stale
    pub fn reset(&mut self) {
        self.generation = self.generation.next();
        self.state = SubmissionState::Idle;
        self.dismiss_at = None;
    }
}
