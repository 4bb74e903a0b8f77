//! Form domain layer
//!
//! Controllers for the message composer and the team status card. Both run
//! on the host's single event loop: submits hand back an [`Outbound`](crate::rpc::Outbound)
//! request, completions and timer ticks are fed back in.

mod document;
mod message_form;
mod status_card;

pub use document::{FieldValue, FormDocument};
pub use message_form::{MessageComposer, MessageContext, MessageDraft};
pub use status_card::{Notice, StatusCard, StatusTone};

use super::submission::{CompletionEffect, DismissAction};
use crate::rpc::Completion;
use std::time::Instant;

/// Common event-loop hooks of a form owning a submission
pub trait FormLifecycle {
    /// Feed back the completion of a request this form issued
    fn on_completion(&mut self, completion: Completion, now: Instant) -> CompletionEffect;

    /// Advance timers; returns the dismiss action when it fires
    fn poll(&mut self, now: Instant) -> Option<DismissAction>;
}
