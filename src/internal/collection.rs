//! Collection triggers: one state machine shared by the immediate and the
//! historical (7 day) backend jobs.
//!
//! `Idle -> [AwaitingConfirmation] -> Running -> Succeeded | Failed -> Idle`
//!
//! Only one job may run at a time. A request made while either job is in
//! flight is dropped locally and never reaches the backend.

use strum_macros::Display;

use crate::api::ApiError;
use crate::internal::models::{CollectionSummary, HistoricalSummary};
use crate::internal::notification::Notification;

/// Days covered by a historical collection run.
pub const HISTORICAL_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CollectionKind {
    #[strum(to_string = "collection")]
    Immediate,
    #[strum(to_string = "historical collection")]
    Historical,
}

impl CollectionKind {
    /// Prompt shown before the job starts, if the kind needs confirmation.
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            Self::Immediate => None,
            Self::Historical => Some(format!(
                "Collect articles from the past {} days?\n\
                 This runs on the backend for about 30-60 seconds.",
                HISTORICAL_WINDOW_DAYS
            )),
        }
    }

    pub fn idle_label(&self) -> String {
        match self {
            Self::Immediate => "Collect".to_string(),
            Self::Historical => format!("Collect {} days", HISTORICAL_WINDOW_DAYS),
        }
    }

    pub fn failure_title(&self) -> &'static str {
        match self {
            Self::Immediate => "Collection failed",
            Self::Historical => "Historical collection failed",
        }
    }

    pub fn busy_label(&self) -> String {
        match self {
            Self::Immediate => "Collecting...".to_string(),
            Self::Historical => format!("Collecting {} days...", HISTORICAL_WINDOW_DAYS),
        }
    }
}

/// Successful job result, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Immediate(CollectionSummary),
    Historical(HistoricalSummary),
}

impl CollectionOutcome {
    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::Immediate(_) => CollectionKind::Immediate,
            Self::Historical(_) => CollectionKind::Historical,
        }
    }

    fn title(&self) -> String {
        match self {
            Self::Immediate(_) => "Collection complete".to_string(),
            Self::Historical(_) => format!(
                "Collection of the past {} days complete",
                HISTORICAL_WINDOW_DAYS
            ),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Immediate(summary) => {
                let mut lines = vec![
                    format!("Collected: {}", summary.collected),
                    format!("Saved: {}", summary.saved),
                ];
                if let Some(medical) = summary.medical {
                    lines.push(format!("Medical: {}", medical));
                }
                if let Some(skipped) = summary.skipped {
                    lines.push(format!("Skipped (duplicates): {}", skipped));
                }
                lines.join("\n")
            }
            Self::Historical(summary) => [
                format!("Period: {}", summary.period),
                format!("Collected: {}", summary.collected),
                format!("Saved: {}", summary.saved),
                format!("Skipped (duplicates): {}", summary.skipped),
            ]
            .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionRunState {
    pub immediate_in_flight: bool,
    pub historical_in_flight: bool,
}

impl CollectionRunState {
    pub fn any_in_flight(&self) -> bool {
        self.immediate_in_flight || self.historical_in_flight
    }

    pub fn is_running(&self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Immediate => self.immediate_in_flight,
            CollectionKind::Historical => self.historical_in_flight,
        }
    }

    fn set(&mut self, kind: CollectionKind, in_flight: bool) {
        match kind {
            CollectionKind::Immediate => self.immediate_in_flight = in_flight,
            CollectionKind::Historical => self.historical_in_flight = in_flight,
        }
    }
}

/// What the caller should do after asking to start a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Send the request now; the job is marked in flight.
    Start(CollectionKind),
    /// Show the prompt and wait for `confirm` or `decline`.
    Confirm { kind: CollectionKind, prompt: String },
    /// Another job is running or a prompt is already open. Nothing was sent.
    Rejected,
}

/// How a finished job should be surfaced.
#[derive(Debug, Clone)]
pub struct CollectionResolution {
    pub kind: CollectionKind,
    pub notification: Notification,
    /// True only on success: new articles may exist.
    pub refresh: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionWorkflow {
    run_state: CollectionRunState,
    pending_confirmation: Option<CollectionKind>,
}

impl CollectionWorkflow {
    pub fn run_state(&self) -> CollectionRunState {
        self.run_state
    }

    pub fn pending_confirmation(&self) -> Option<CollectionKind> {
        self.pending_confirmation
    }

    /// Controls are disabled while a job runs or a prompt is open.
    pub fn controls_enabled(&self) -> bool {
        !self.run_state.any_in_flight() && self.pending_confirmation.is_none()
    }

    pub fn request(&mut self, kind: CollectionKind) -> TriggerDecision {
        if !self.controls_enabled() {
            tracing::debug!(%kind, state = ?self.run_state, "collection request rejected");
            return TriggerDecision::Rejected;
        }

        match kind.confirmation_prompt() {
            Some(prompt) => {
                self.pending_confirmation = Some(kind);
                TriggerDecision::Confirm { kind, prompt }
            }
            None => {
                self.run_state.set(kind, true);
                TriggerDecision::Start(kind)
            }
        }
    }

    /// Accept the open prompt. Returns the kind to start, if any.
    pub fn confirm(&mut self) -> Option<CollectionKind> {
        let kind = self.pending_confirmation.take()?;
        if self.run_state.any_in_flight() {
            return None;
        }
        self.run_state.set(kind, true);
        Some(kind)
    }

    /// Dismiss the open prompt without sending anything.
    pub fn decline(&mut self) -> Option<CollectionKind> {
        self.pending_confirmation.take()
    }

    pub fn finish(
        &mut self,
        kind: CollectionKind,
        result: Result<CollectionOutcome, ApiError>,
    ) -> CollectionResolution {
        if !self.run_state.is_running(kind) {
            tracing::warn!(%kind, "finished a collection that was not marked in flight");
        }
        self.run_state.set(kind, false);

        match result {
            Ok(outcome) => {
                tracing::info!(%kind, outcome = ?outcome, "collection succeeded");
                CollectionResolution {
                    kind,
                    notification: Notification::alert(outcome.title(), outcome.describe()),
                    refresh: true,
                }
            }
            Err(err) => {
                tracing::error!(%kind, error = %err, "collection failed");
                CollectionResolution {
                    kind,
                    notification: Notification::error_alert(kind.failure_title(), err.to_string()),
                    refresh: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ServiceError;

    fn rate_limited() -> ApiError {
        ApiError::Service(ServiceError {
            status: Some(429),
            error: "RATE_LIMITED".to_string(),
            message: Some("retry after 60s".to_string()),
            docs: None,
        })
    }

    #[test]
    fn immediate_starts_without_confirmation() {
        let mut workflow = CollectionWorkflow::default();
        assert_eq!(
            workflow.request(CollectionKind::Immediate),
            TriggerDecision::Start(CollectionKind::Immediate)
        );
        assert!(workflow.run_state().immediate_in_flight);
        assert!(!workflow.controls_enabled());
    }

    #[test]
    fn historical_waits_for_confirmation() {
        let mut workflow = CollectionWorkflow::default();
        let decision = workflow.request(CollectionKind::Historical);

        match decision {
            TriggerDecision::Confirm { kind, prompt } => {
                assert_eq!(kind, CollectionKind::Historical);
                assert!(prompt.contains("7 days"));
                assert!(prompt.contains("30-60 seconds"));
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
        assert!(!workflow.run_state().any_in_flight());

        assert_eq!(workflow.confirm(), Some(CollectionKind::Historical));
        assert!(workflow.run_state().historical_in_flight);
    }

    #[test]
    fn declining_sends_nothing() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Historical);
        assert_eq!(workflow.decline(), Some(CollectionKind::Historical));
        assert_eq!(workflow.run_state(), CollectionRunState::default());
        assert_eq!(workflow.confirm(), None);
        assert!(workflow.controls_enabled());
    }

    #[test]
    fn historical_rejected_while_immediate_in_flight() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Immediate);
        let before = workflow.run_state();

        assert_eq!(
            workflow.request(CollectionKind::Historical),
            TriggerDecision::Rejected
        );
        assert_eq!(workflow.run_state(), before);
        assert_eq!(workflow.pending_confirmation(), None);
    }

    #[test]
    fn immediate_rejected_while_historical_in_flight() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Historical);
        workflow.confirm();
        assert_eq!(
            workflow.request(CollectionKind::Immediate),
            TriggerDecision::Rejected
        );
    }

    #[test]
    fn success_reports_counts_and_requests_refresh() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Immediate);

        let resolution = workflow.finish(
            CollectionKind::Immediate,
            Ok(CollectionOutcome::Immediate(CollectionSummary {
                collected: 15,
                saved: 9,
                medical: None,
                skipped: None,
            })),
        );

        assert!(resolution.refresh);
        assert!(resolution.notification.requires_ack);
        insta::assert_snapshot!(resolution.notification.message, @r"
        Collected: 15
        Saved: 9
        ");
        assert!(workflow.controls_enabled());
    }

    #[test]
    fn failure_keeps_full_error_and_skips_refresh() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Immediate);

        let resolution = workflow.finish(CollectionKind::Immediate, Err(rate_limited()));

        assert!(!resolution.refresh);
        assert_eq!(resolution.notification.title, "Collection failed");
        assert!(resolution.notification.message.contains("RATE_LIMITED"));
        assert!(resolution.notification.message.contains("retry after 60s"));
        assert!(workflow.controls_enabled());
    }

    #[test]
    fn historical_failure_title() {
        let mut workflow = CollectionWorkflow::default();
        workflow.request(CollectionKind::Historical);
        workflow.confirm();

        let resolution = workflow.finish(CollectionKind::Historical, Err(rate_limited()));
        assert_eq!(
            resolution.notification.title,
            "Historical collection failed"
        );
    }

    #[test]
    fn historical_success_lists_period() {
        let outcome = CollectionOutcome::Historical(HistoricalSummary {
            period: "2024-02-23 ~ 2024-03-01".to_string(),
            collected: 310,
            saved: 120,
            skipped: 190,
        });
        assert_eq!(outcome.kind(), CollectionKind::Historical);
        let text = outcome.describe();
        assert!(text.starts_with("Period: 2024-02-23 ~ 2024-03-01"));
        assert!(text.ends_with("Skipped (duplicates): 190"));
    }
}
