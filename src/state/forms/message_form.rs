//! Message composer
//!
//! Sends a message either to the students of one fixed team or to every
//! member of a free selection of teams. The mode is chosen at construction
//! and never changes.

use super::document::FormDocument;
use super::FormLifecycle;
use crate::error::{SelectionError, SubmitBlocked};
use crate::rpc::{Completion, Outbound, RpcRequest, SubmitMessageArgs};
use crate::state::selection::{Keyed, SelectionSet};
use crate::state::submission::{
    failure_detail, CompletionEffect, DismissAction, SubmissionMachine, SubmissionState,
};
use crate::state::team::{NotifyTarget, Student, TeamId, TeamRef};
use crate::state::validation::{Ruleset, ValidationReport, ValidationRule};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const SUCCESS_MESSAGE: &str =
    "Success! Your message has been posted and notifications are being sent.";
pub const FORM_ERROR_BANNER: &str = "Correct form errors and try again.";

/// Who the message is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContext {
    /// The students of one team, seeded from its roster
    FixedTeam(TeamId),
    /// Teams picked freely; the server resolves their members
    FreeSelection,
}

/// User-editable fields of the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub subject: String,
    pub message: String,
    pub notify: Vec<NotifyTarget>,
}

impl Default for MessageDraft {
    fn default() -> Self {
        Self {
            subject: String::new(),
            message: String::new(),
            notify: vec![NotifyTarget::Students],
        }
    }
}

fn message_rules() -> Ruleset {
    Ruleset::new()
        .rule("subject", ValidationRule::required("Title is required."))
        .rule("message", ValidationRule::required("Message is required."))
        .rule("teams", ValidationRule::required("Teams are required."))
}

#[derive(Debug)]
pub struct MessageComposer {
    id: Uuid,
    context: MessageContext,
    opened: bool,
    roster: Vec<Student>,
    draft: MessageDraft,
    recipients: SelectionSet<Student>,
    teams: SelectionSet<TeamRef>,
    rules: Ruleset,
    report: ValidationReport,
    submission: SubmissionMachine,
}

impl MessageComposer {
    /// `roster` seeds the recipients in fixed-team mode and is ignored otherwise
    pub fn new(context: MessageContext, roster: Vec<Student>, dismiss_after: Duration) -> Self {
        let recipients = match context {
            MessageContext::FixedTeam(_) => SelectionSet::from_items(roster.iter().cloned()),
            MessageContext::FreeSelection => SelectionSet::new(),
        };
        Self {
            id: Uuid::new_v4(),
            context,
            opened: false,
            roster,
            draft: MessageDraft::default(),
            recipients,
            teams: SelectionSet::new(),
            rules: message_rules(),
            report: ValidationReport::default(),
            submission: SubmissionMachine::new(dismiss_after, DismissAction::CloseDialog),
        }
    }

    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Open the dialog with a fresh lifecycle
    ///
    /// Cancels any pending auto-close and discards responses still in
    /// flight from the previous opening.
    pub fn open(&mut self) {
        self.draft = MessageDraft::default();
        self.teams.clear();
        self.reseed_recipients();
        self.report = ValidationReport::default();
        self.submission.reset();
        self.opened = true;
        tracing::debug!(
            form = %self.id,
            generation = %self.submission.generation(),
            "message composer opened"
        );
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.submission.reset();
        tracing::debug!(form = %self.id, "message composer closed");
    }

    pub fn draft(&self) -> &MessageDraft {
        &self.draft
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.draft.subject = subject.into();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.draft.message = message.into();
    }

    /// Replace the notified groups, kept in canonical order without repeats
    pub fn set_notify(&mut self, targets: impl IntoIterator<Item = NotifyTarget>) {
        let chosen: Vec<NotifyTarget> = targets.into_iter().collect();
        self.draft.notify = NotifyTarget::ALL
            .into_iter()
            .filter(|target| chosen.contains(target))
            .collect();
    }

    pub fn toggle_notify(&mut self, target: NotifyTarget) {
        let mut chosen = self.draft.notify.clone();
        if chosen.contains(&target) {
            chosen.retain(|t| *t != target);
        } else {
            chosen.push(target);
        }
        self.set_notify(chosen);
    }

    pub fn recipients(&self) -> &SelectionSet<Student> {
        &self.recipients
    }

    pub fn teams(&self) -> &SelectionSet<TeamRef> {
        &self.teams
    }

    /// Replace the externally supplied roster and re-seed the recipients
    pub fn set_roster(&mut self, roster: Vec<Student>) {
        self.roster = roster;
        self.reseed_recipients();
    }

    fn reseed_recipients(&mut self) {
        self.recipients = match self.context {
            MessageContext::FixedTeam(_) => SelectionSet::from_items(self.roster.iter().cloned()),
            MessageContext::FreeSelection => SelectionSet::new(),
        };
    }

    /// Drop a student from the recipients. Returns whether one was removed.
    pub fn remove_recipient(&mut self, username: &str) -> bool {
        self.recipients.remove(username).is_some()
    }

    /// Add a team from the picker. Returns whether it was newly selected.
    pub fn select_team(&mut self, team: TeamRef) -> Result<bool, SelectionError> {
        if let MessageContext::FixedTeam(_) = self.context {
            return Err(SelectionError::FixedTeam);
        }
        Ok(self.teams.add(team))
    }

    /// Picker callback taking the widget's raw JSON value
    pub fn select_team_json(&mut self, raw: &str) -> Result<bool, SelectionError> {
        let team = TeamRef::from_picker_json(raw)?;
        self.select_team(team)
    }

    pub fn remove_team(&mut self, id: &TeamId) -> bool {
        self.teams.remove(id).is_some()
    }

    /// Current report, including the top-level submission error
    pub fn errors(&self) -> &ValidationReport {
        &self.report
    }

    pub fn form_error_banner(&self) -> Option<&'static str> {
        self.report.has_errors().then_some(FORM_ERROR_BANNER)
    }

    pub fn state(&self) -> &SubmissionState {
        self.submission.state()
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_submitting()
    }

    pub fn success_message(&self) -> Option<&'static str> {
        self.submission.is_succeeded().then_some(SUCCESS_MESSAGE)
    }

    /// Validation view of the form, with selections in payload form
    pub fn document(&self) -> FormDocument {
        let payload = self.payload();
        FormDocument::new()
            .with("subject", payload.subject)
            .with("message", payload.message)
            .with(
                "notify",
                payload
                    .notify
                    .iter()
                    .map(|t| t.as_wire().to_string())
                    .collect::<Vec<_>>(),
            )
            .with(
                "teams",
                payload
                    .teams
                    .iter()
                    .map(|id| id.as_str().to_string())
                    .collect::<Vec<_>>(),
            )
            .with("students", payload.students)
    }

    pub fn validate(&self) -> ValidationReport {
        self.rules.validate(&self.document())
    }

    /// Normalize the form into the transport payload
    pub fn payload(&self) -> SubmitMessageArgs {
        let (teams, students) = match &self.context {
            MessageContext::FixedTeam(team_id) => (
                vec![team_id.clone()],
                self.recipients.keys().map(str::to_string).collect(),
            ),
            MessageContext::FreeSelection => (
                self.teams.iter().map(|team| team.key().clone()).collect(),
                Vec::new(),
            ),
        };
        SubmitMessageArgs {
            teams,
            students,
            subject: self.draft.subject.clone(),
            message: self.draft.message.clone(),
            notify: self.draft.notify.clone(),
        }
    }

    /// Validate and, if clean, start the submission
    ///
    /// Ignored without side effects while a submission is in flight.
    pub fn submit(&mut self) -> Result<Outbound, SubmitBlocked> {
        if !self.opened {
            return Err(SubmitBlocked::Closed);
        }
        if self.submission.is_submitting() {
            return Err(SubmitBlocked::InFlight);
        }
        if self.submission.is_succeeded() {
            return Err(SubmitBlocked::Completed);
        }

        self.report = self.validate();
        if self.report.has_errors() {
            tracing::debug!(form = %self.id, "message blocked by validation");
            return Err(SubmitBlocked::Invalid);
        }

        let generation = self.submission.begin()?;
        let request = RpcRequest::SubmitMessage(self.payload());
        tracing::info!(form = %self.id, %generation, "submitting message");
        Ok(Outbound {
            generation,
            request,
        })
    }
}

impl FormLifecycle for MessageComposer {
    fn on_completion(&mut self, completion: Completion, now: Instant) -> CompletionEffect {
        let generation = completion.generation;
        let outcome = completion
            .outcome()
            .map(|_| ())
            .map_err(|message| failure_detail(message.as_deref()));

        let effect = self.submission.complete(generation, outcome, now);
        if let CompletionEffect::Failed(detail) = &effect {
            self.report.set_top_level_error(detail.clone());
        }
        effect
    }

    fn poll(&mut self, now: Instant) -> Option<DismissAction> {
        let action = self.submission.poll(now)?;
        if action == DismissAction::CloseDialog {
            self.close();
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::test_support::{fail, succeed};
    use serde_json::json;

    const DISMISS: Duration = Duration::from_millis(3000);

    fn roster() -> Vec<Student> {
        vec![
            Student::new("alice", "Alice", "Archer"),
            Student::new("bob", "Bob", "Baker"),
        ]
    }

    fn fixed_team() -> MessageComposer {
        let mut composer = MessageComposer::new(
            MessageContext::FixedTeam(TeamId::from("T1")),
            roster(),
            DISMISS,
        );
        composer.open();
        composer
    }

    fn free_selection() -> MessageComposer {
        let mut composer = MessageComposer::new(MessageContext::FreeSelection, vec![], DISMISS);
        composer.open();
        composer
    }

    fn filled(mut composer: MessageComposer) -> MessageComposer {
        composer.set_subject("Practice");
        composer.set_message("Moved to 5pm");
        composer
    }

    mod validation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_empty_subject_and_message_rejected() {
            let mut composer = fixed_team();
            assert_eq!(composer.submit(), Err(SubmitBlocked::Invalid));

            let report = composer.errors();
            assert!(report.has_errors());
            assert!(!report.field_errors("subject").is_empty());
            assert!(!report.field_errors("message").is_empty());
            assert_eq!(composer.form_error_banner(), Some(FORM_ERROR_BANNER));
            assert_eq!(composer.state(), &SubmissionState::Idle);
        }

        #[test]
        fn test_teams_required_in_free_selection() {
            let mut composer = filled(free_selection());
            assert_eq!(composer.submit(), Err(SubmitBlocked::Invalid));
            assert_eq!(
                composer.errors().field_errors("teams"),
                ["Teams are required."]
            );
        }

        #[test]
        fn test_teams_not_required_for_fixed_team() {
            let composer = filled(fixed_team());
            assert!(composer.validate().field_errors("teams").is_empty());
        }

        #[test]
        fn test_errors_cleared_on_clean_submit() {
            let mut composer = fixed_team();
            let _ = composer.submit();
            let mut composer = filled(composer);
            assert!(composer.submit().is_ok());
            assert!(!composer.errors().has_errors());
            assert!(composer.form_error_banner().is_none());
        }
    }

    mod normalization {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_fixed_team_payload_uses_remaining_recipients() {
            let mut composer = filled(fixed_team());
            assert!(composer.remove_recipient("bob"));

            let payload = composer.payload();
            assert_eq!(payload.teams, vec![TeamId::from("T1")]);
            assert_eq!(payload.students, vec!["alice".to_string()]);
        }

        #[test]
        fn test_free_selection_payload_uses_selected_teams() {
            let mut composer = filled(free_selection());
            composer.select_team(TeamRef::new(5u64, "Eagles")).unwrap();
            composer.select_team(TeamRef::new(7u64, "Hawks")).unwrap();
            composer.remove_team(&TeamId::from(5u64));

            let payload = composer.payload();
            assert_eq!(payload.teams, vec![TeamId::from(7u64)]);
            assert!(payload.students.is_empty());
        }

        #[test]
        fn test_outbound_carries_full_payload() {
            let mut composer = filled(fixed_team());
            composer.set_notify([NotifyTarget::TeamStaff, NotifyTarget::Parents]);
            let outbound = composer.submit().unwrap();

            assert_eq!(
                outbound.request,
                RpcRequest::SubmitMessage(SubmitMessageArgs {
                    teams: vec![TeamId::from("T1")],
                    students: vec!["alice".to_string(), "bob".to_string()],
                    subject: "Practice".to_string(),
                    message: "Moved to 5pm".to_string(),
                    notify: vec![NotifyTarget::Parents, NotifyTarget::TeamStaff],
                })
            );
        }
    }

    mod selections {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_select_team_rejected_for_fixed_team() {
            let mut composer = fixed_team();
            let err = composer
                .select_team(TeamRef::new(5u64, "Eagles"))
                .unwrap_err();
            assert!(matches!(err, SelectionError::FixedTeam));
            assert!(composer.teams().is_empty());
        }

        #[test]
        fn test_select_team_json_from_picker() {
            let mut composer = free_selection();
            assert!(composer
                .select_team_json(r#"{"id":5,"name":"Eagles"}"#)
                .unwrap());
            assert!(!composer
                .select_team_json(r#"{"id":"5","name":"Eagles again"}"#)
                .unwrap());
            assert_eq!(composer.teams().len(), 1);
        }

        #[test]
        fn test_select_team_json_invalid_payload() {
            let mut composer = free_selection();
            let err = composer.select_team_json("{oops").unwrap_err();
            assert!(matches!(err, SelectionError::InvalidPayload(_)));
        }

        #[test]
        fn test_set_roster_reseeds_recipients() {
            let mut composer = fixed_team();
            composer.remove_recipient("alice");
            composer.set_roster(vec![Student::new("cara", "Cara", "Cole")]);
            let keys: Vec<_> = composer.recipients().keys().collect();
            assert_eq!(keys, ["cara"]);
        }

        #[test]
        fn test_free_selection_has_no_recipients() {
            let mut composer =
                MessageComposer::new(MessageContext::FreeSelection, roster(), DISMISS);
            composer.open();
            assert!(composer.recipients().is_empty());
            assert!(!composer.remove_recipient("alice"));
        }

        #[test]
        fn test_toggle_notify_keeps_canonical_order() {
            let mut composer = fixed_team();
            composer.toggle_notify(NotifyTarget::TeamStaff);
            composer.toggle_notify(NotifyTarget::Parents);
            assert_eq!(composer.draft().notify, NotifyTarget::ALL.to_vec());
            composer.toggle_notify(NotifyTarget::Students);
            assert_eq!(
                composer.draft().notify,
                vec![NotifyTarget::Parents, NotifyTarget::TeamStaff]
            );
        }
    }

    mod lifecycle {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_second_submit_while_in_flight_ignored() {
            let mut composer = filled(fixed_team());
            let first = composer.submit().unwrap();
            assert_eq!(composer.submit(), Err(SubmitBlocked::InFlight));
            assert!(composer.is_submitting());
            assert_eq!(composer.state(), &SubmissionState::Submitting);
            assert_eq!(first.generation, composer.submission.generation());
        }

        #[test]
        fn test_success_auto_closes_once_after_delay() {
            let mut composer = filled(fixed_team());
            let outbound = composer.submit().unwrap();
            let t0 = Instant::now();

            assert_eq!(
                composer.on_completion(succeed(&outbound, json!({})), t0),
                CompletionEffect::Succeeded
            );
            assert_eq!(composer.success_message(), Some(SUCCESS_MESSAGE));
            assert!(composer.poll(t0 + Duration::from_millis(2999)).is_none());
            assert!(composer.is_open());

            assert_eq!(
                composer.poll(t0 + DISMISS),
                Some(DismissAction::CloseDialog)
            );
            assert!(!composer.is_open());
            assert!(composer.poll(t0 + DISMISS * 2).is_none());
        }

        #[test]
        fn test_reopen_cancels_auto_close() {
            let mut composer = filled(fixed_team());
            let outbound = composer.submit().unwrap();
            let t0 = Instant::now();
            composer.on_completion(succeed(&outbound, json!({})), t0);

            composer.open();
            assert!(composer.poll(t0 + DISMISS).is_none());
            assert!(composer.is_open());
            assert_eq!(composer.state(), &SubmissionState::Idle);
            assert_eq!(composer.draft(), &MessageDraft::default());
        }

        #[test]
        fn test_submit_after_success_refused() {
            let mut composer = filled(fixed_team());
            let outbound = composer.submit().unwrap();
            composer.on_completion(succeed(&outbound, json!({})), Instant::now());
            assert_eq!(composer.submit(), Err(SubmitBlocked::Completed));
        }

        #[test]
        fn test_failure_surfaces_message_and_keeps_draft() {
            let mut composer = filled(fixed_team());
            composer.remove_recipient("bob");
            let draft_before = composer.draft().clone();
            let payload_before = composer.payload();

            let outbound = composer.submit().unwrap();
            let effect =
                composer.on_completion(fail(&outbound, Some("quota exceeded")), Instant::now());

            assert!(matches!(effect, CompletionEffect::Failed(_)));
            let error = composer.errors().top_level_error().unwrap();
            assert!(error.contains("quota exceeded"));
            assert!(!composer.errors().has_errors());
            assert_eq!(composer.draft(), &draft_before);
            assert_eq!(composer.payload(), payload_before);
        }

        #[test]
        fn test_failure_without_exception_uses_fallback() {
            let mut composer = filled(fixed_team());
            let outbound = composer.submit().unwrap();
            composer.on_completion(fail(&outbound, None), Instant::now());
            assert_eq!(
                composer.errors().top_level_error(),
                Some("There was an error submitting.")
            );
        }

        #[test]
        fn test_resubmit_after_failure_goes_straight_to_submitting() {
            let mut composer = filled(fixed_team());
            let outbound = composer.submit().unwrap();
            composer.on_completion(fail(&outbound, Some("quota exceeded")), Instant::now());

            let retry = composer.submit().unwrap();
            assert!(composer.is_submitting());
            assert!(composer.errors().top_level_error().is_none());
            assert_eq!(retry.generation, outbound.generation);
        }

        #[test]
        fn test_response_from_previous_opening_ignored() {
            let mut composer = filled(fixed_team());
            let stale = composer.submit().unwrap();
            composer.open();

            let effect =
                composer.on_completion(fail(&stale, Some("quota exceeded")), Instant::now());
            assert_eq!(effect, CompletionEffect::Stale);
            assert!(composer.errors().top_level_error().is_none());
            assert_eq!(composer.state(), &SubmissionState::Idle);
        }

        #[test]
        fn test_submit_when_closed_refused() {
            let mut composer =
                MessageComposer::new(MessageContext::FreeSelection, vec![], DISMISS);
            assert_eq!(composer.submit(), Err(SubmitBlocked::Closed));
        }

        #[test]
        fn test_reopen_after_failure_is_full_reset() {
            let mut composer = filled(fixed_team());
            composer.remove_recipient("bob");
            let outbound = composer.submit().unwrap();
            composer.on_completion(fail(&outbound, Some("quota exceeded")), Instant::now());

            composer.open();
            assert_eq!(composer.state(), &SubmissionState::Idle);
            assert_eq!(composer.draft(), &MessageDraft::default());
            assert_eq!(composer.recipients().len(), 2);
            assert!(composer.errors().top_level_error().is_none());
        }
    }
}
