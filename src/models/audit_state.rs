/// Identifier of the "checking archives" progress notification.
pub const CHECKING_NOTIFICATION_ID: &str = "archive-version-check";

/// Identifier of the "incompatible archives" result notification.
pub const RESULT_NOTIFICATION_ID: &str = "archive-version-mismatch";

/// Label of the action that reveals the detail report.
pub const SHOW_DETAILS_ACTION: &str = "Show details";

/// Severity of the result notification. Incompatible archives are always
/// reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

/// Progress shown while a batch of archives is being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressNotification {
    pub id: String,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub title: String,
    /// Archive currently being read
    pub message: String,
}

/// Summary shown when a batch found incompatible archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultNotification {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub action: String,
}

/// Visible audit state for the current session.
///
/// Each notification kind has exactly one slot, so a new batch replaces
/// whatever the previous batch left behind instead of stacking a second
/// notification next to it.
///
/// Wrapped in `Arc<RwLock<AuditState>>` by [`crate::state::StateManager`];
/// always go through the manager so change events are emitted.
#[derive(Clone, Debug, Default)]
pub struct AuditState {
    /// "Checking archives" slot
    pub checking: Option<ProgressNotification>,

    /// "Incompatible archives" slot
    pub result: Option<ResultNotification>,

    /// Detail report behind the result's "show details" action
    pub report: Option<String>,

    /// Game the last batch ran for
    pub game_id: Option<String>,

    /// Issues found by the last finished batch
    pub issue_count: usize,

    // Batch counters
    pub batches_started: usize,
    pub batches_finished: usize,
}

impl AuditState {
    pub fn is_checking(&self) -> bool {
        self.checking.is_some()
    }

    pub fn has_issues(&self) -> bool {
        self.result.is_some()
    }
}

/// Percentage of `completed` out of `total`, clamped to `0..=100`.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AuditState::default();
        assert!(!state.is_checking());
        assert!(!state.has_issues());
        assert!(state.report.is_none());
        assert_eq!(state.batches_started, 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 4), 0);
        assert_eq!(progress_percent(1, 4), 25);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(4, 4), 100);
        assert_eq!(progress_percent(9, 4), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }
}
