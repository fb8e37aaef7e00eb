// State management module
//
// This module provides the StateManager which wraps AuditState with thread-safe access
// using Arc<RwLock<T>> and emits change events for whatever presents the notifications.

use crate::models::{
    AuditState, CHECKING_NOTIFICATION_ID, ProgressNotification, RESULT_NOTIFICATION_ID,
    ResultNotification, SHOW_DETAILS_ACTION, Severity, progress_percent,
};
use crate::services::detector::{ProgressEvent, ProgressSink};
use crate::services::report::AuditReport;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Title of the progress notification.
pub const CHECKING_TITLE: &str = "Checking archives";

/// Title of the result notification.
pub const RESULT_TITLE: &str = "Incompatible archives";

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A batch has started for a game
    BatchStarted {
        game_id: String,
    },

    /// The "checking" notification was shown or updated
    ProgressUpdated {
        id: String,
        progress: u8,
        message: String,
    },

    /// The "checking" notification was removed
    ProgressDismissed {
        id: String,
    },

    /// The "result" notification was shown or replaced
    ResultShown {
        id: String,
        issue_count: usize,
    },

    /// The "result" notification was removed
    ResultDismissed {
        id: String,
    },

    /// A batch has completed
    BatchFinished {
        issue_count: usize,
    },
}

/// Thread-safe state manager with event emission
///
/// Owns the two notification slots of [`AuditState`] and is the only place
/// that mutates them:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// It also implements [`ProgressSink`], so a detector batch drives the
/// "checking" slot directly.
pub struct StateManager {
    state: Arc<RwLock<AuditState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AuditState::default())),
            state_tx,
        }
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> AuditState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let has_issues = state_manager.read(|state| state.has_issues());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AuditState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AuditState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AuditState, new: &AuditState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.batches_started != new.batches_started {
            changes.push(StateChange::BatchStarted {
                game_id: new.game_id.clone().unwrap_or_default(),
            });
        }

        if old.checking != new.checking {
            match &new.checking {
                Some(progress) => changes.push(StateChange::ProgressUpdated {
                    id: progress.id.clone(),
                    progress: progress.progress,
                    message: progress.message.clone(),
                }),
                None => changes.push(StateChange::ProgressDismissed {
                    id: CHECKING_NOTIFICATION_ID.to_string(),
                }),
            }
        }

        if old.result != new.result || (new.result.is_some() && old.report != new.report) {
            match &new.result {
                Some(result) => changes.push(StateChange::ResultShown {
                    id: result.id.clone(),
                    issue_count: new.issue_count,
                }),
                None => changes.push(StateChange::ResultDismissed {
                    id: RESULT_NOTIFICATION_ID.to_string(),
                }),
            }
        }

        if old.batches_finished != new.batches_finished {
            changes.push(StateChange::BatchFinished {
                issue_count: new.issue_count,
            });
        }

        changes
    }

    // Convenience methods for the audit pipeline

    /// Record the start of a batch for `game_id`.
    pub fn begin_batch(&self, game_id: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.game_id = Some(game_id.to_string());
            state.batches_started += 1;
        })
    }

    /// Show or update the "checking" notification.
    pub fn show_progress(&self, event: &ProgressEvent) -> Vec<StateChange> {
        let notification = ProgressNotification {
            id: CHECKING_NOTIFICATION_ID.to_string(),
            progress: progress_percent(event.completed, event.total),
            title: CHECKING_TITLE.to_string(),
            message: event.current_archive.clone(),
        };

        self.update(|state| {
            state.checking = Some(notification);
        })
    }

    /// Remove the "checking" notification.
    pub fn dismiss_progress(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.checking = None;
        })
    }

    /// Record the end of a batch.
    ///
    /// With a non-empty report the "result" slot is replaced by a fresh
    /// notification; otherwise any result left by an earlier batch is
    /// removed, since it no longer describes the installation.
    pub fn finish_batch(&self, report: Option<&AuditReport>) -> Vec<StateChange> {
        let report = report.filter(|r| !r.is_empty());

        self.update(|state| {
            state.batches_finished += 1;

            match report {
                Some(report) => {
                    let issue_count = report.issue_count();
                    state.issue_count = issue_count;
                    state.report = Some(report.to_string());
                    state.result = Some(ResultNotification {
                        id: RESULT_NOTIFICATION_ID.to_string(),
                        severity: Severity::Error,
                        title: RESULT_TITLE.to_string(),
                        message: format!(
                            "{} archive(s) do not match the format {} expects",
                            issue_count, report.game.display_name
                        ),
                        action: SHOW_DETAILS_ACTION.to_string(),
                    });
                }
                None => {
                    state.issue_count = 0;
                    state.report = None;
                    state.result = None;
                }
            }
        })
    }

    /// Remove the "result" notification (user dismissed it).
    pub fn dismiss_result(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.result = None;
            state.report = None;
        })
    }

    /// Detail report behind the result notification's action, if shown.
    pub fn show_details(&self) -> Option<String> {
        self.read(|state| state.result.as_ref().and(state.report.clone()))
    }
}

impl ProgressSink for StateManager {
    fn progress(&self, event: &ProgressEvent) {
        self.show_progress(event);
    }

    fn finished(&self) {
        self.dismiss_progress();
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
