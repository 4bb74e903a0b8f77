//! Team status card: publish state, save feedback and the publish workflow

use super::FormLifecycle;
use crate::error::SubmitBlocked;
use crate::rpc::{Completion, Outbound, PublishTeamArgs, RpcRequest};
use crate::state::submission::{
    CompletionEffect, DismissAction, Generation, SubmissionMachine, GENERIC_FAILURE,
};
use crate::state::team::{TeamId, TeamStatus};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Background tone of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Neutral,
    Pending,
    Live,
}

/// Line of text under the headline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    Error(&'a str),
    Info(&'a str),
}

#[derive(Debug)]
pub struct StatusCard {
    id: Uuid,
    /// Absent while creating a team that was never saved
    team_id: Option<TeamId>,
    status: TeamStatus,
    has_changes: bool,
    form_loaded: bool,
    students_loaded: bool,
    /// The enclosing team form's save call, issued by the host
    save: SubmissionMachine,
    publish: SubmissionMachine,
}

impl StatusCard {
    pub fn new(team_id: Option<TeamId>, status: TeamStatus, indicator_for: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            status,
            has_changes: false,
            form_loaded: false,
            students_loaded: false,
            save: SubmissionMachine::new(indicator_for, DismissAction::ClearIndicator),
            publish: SubmissionMachine::new(indicator_for, DismissAction::ClearIndicator),
        }
    }

    pub fn status(&self) -> TeamStatus {
        self.status
    }

    pub fn set_has_changes(&mut self, has_changes: bool) {
        self.has_changes = has_changes;
    }

    pub fn mark_form_loaded(&mut self) {
        self.form_loaded = true;
    }

    pub fn mark_students_loaded(&mut self) {
        self.students_loaded = true;
    }

    /// Existing teams stay hidden until their details and students have loaded
    pub fn is_ready(&self) -> bool {
        self.team_id.is_none() || (self.form_loaded && self.students_loaded)
    }

    pub fn headline(&self) -> &'static str {
        match self.status {
            TeamStatus::Unsaved | TeamStatus::Saved => "Draft",
            TeamStatus::Live => "Published",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self.status {
            TeamStatus::Unsaved => StatusTone::Neutral,
            TeamStatus::Saved => StatusTone::Pending,
            TeamStatus::Live => StatusTone::Live,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.save.is_submitting() || self.publish.is_submitting()
    }

    pub fn can_publish(&self) -> bool {
        !self.has_changes && self.status == TeamStatus::Saved && self.team_id.is_some()
    }

    pub fn can_return_to_planning(&self) -> bool {
        self.status == TeamStatus::Live && self.team_id.is_some()
    }

    pub fn show_saved_indicator(&self) -> bool {
        !self.save.is_submitting()
            && self.save.failure().is_none()
            && !self.has_changes
            && (self.save.is_succeeded() || self.publish.is_succeeded())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.save.failure().or_else(|| self.publish.failure())
    }

    /// Text under the headline; nothing while a save is in flight
    pub fn notice(&self) -> Option<Notice<'_>> {
        if self.save.is_submitting() {
            return None;
        }
        if let Some(message) = self.error_message() {
            return Some(Notice::Error(message));
        }
        if self.has_changes {
            return Some(Notice::Error("There are unsaved changes."));
        }
        Some(Notice::Info(match self.status {
            TeamStatus::Saved => "Publish this team to make it visible.",
            TeamStatus::Live => "Team is live! You may continue to make changes to information.",
            TeamStatus::Unsaved => "Get started by entering the details for this team.",
        }))
    }

    pub fn publish(&mut self) -> Result<Outbound, SubmitBlocked> {
        if self.publish.is_submitting() {
            return Err(SubmitBlocked::InFlight);
        }
        if !self.can_publish() {
            return Err(SubmitBlocked::NotAllowed(
                "only a saved team without unsaved changes can be published",
            ));
        }
        self.request_status(true)
    }

    pub fn return_to_planning(&mut self) -> Result<Outbound, SubmitBlocked> {
        if self.publish.is_submitting() {
            return Err(SubmitBlocked::InFlight);
        }
        if !self.can_return_to_planning() {
            return Err(SubmitBlocked::NotAllowed("only a live team can return to planning"));
        }
        self.request_status(false)
    }

    fn request_status(&mut self, publish: bool) -> Result<Outbound, SubmitBlocked> {
        let team_id = self
            .team_id
            .clone()
            .ok_or(SubmitBlocked::NotAllowed("the team has not been saved"))?;
        let generation = self.publish.begin()?;
        tracing::info!(
            form = %self.id,
            team = %team_id,
            publish,
            %generation,
            "changing team status"
        );
        Ok(Outbound {
            generation,
            request: RpcRequest::PublishTeam(PublishTeamArgs::new(team_id, publish)),
        })
    }

    /// The host started saving the team form
    ///
    /// Hides any showing indicator or publish error and returns the generation to tag the
    /// save completion with.
    pub fn save_started(&mut self) -> Result<Generation, SubmitBlocked> {
        self.publish.acknowledge();
        self.save.begin()
    }

    pub fn save_finished(&mut self, completion: Completion, now: Instant) -> CompletionEffect {
        let generation = completion.generation;
        let outcome = completion
            .outcome()
            .map(|_| ())
            .map_err(|message| message.unwrap_or_else(|| GENERIC_FAILURE.to_string()));
        self.save.complete(generation, outcome, now)
    }
}

impl FormLifecycle for StatusCard {
    /// Completion of a publish/unpublish request
    fn on_completion(&mut self, completion: Completion, now: Instant) -> CompletionEffect {
        let generation = completion.generation;
        let outcome = completion.outcome();
        let status = outcome
            .as_ref()
            .ok()
            .and_then(|data| data.get("status"))
            .cloned()
            .map(serde_json::from_value::<TeamStatus>);

        let effect = self.publish.complete(
            generation,
            outcome
                .map(|_| ())
                .map_err(|message| message.unwrap_or_else(|| GENERIC_FAILURE.to_string())),
            now,
        );

        if effect == CompletionEffect::Succeeded {
            match status {
                Some(Ok(status)) => self.status = status,
                Some(Err(e)) => {
                    tracing::warn!(
                        form = %self.id,
                        error = %e,
                        "unrecognised status in publish response"
                    )
                }
                None => tracing::warn!(form = %self.id, "publish response carried no status"),
            }
        }
        effect
    }

    fn poll(&mut self, now: Instant) -> Option<DismissAction> {
        let save = self.save.poll(now);
        let publish = self.publish.poll(now);
        save.or(publish)
    }
}
