//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events for both notification slots
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple tasks
//! - Replaces stale notifications when a new batch finishes

use bsaguard::models::{ArchiveIssue, GameProfiles};
use bsaguard::services::{AuditReport, ProgressEvent, ProgressSink};
use bsaguard::{StateChange, StateManager};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn progress(completed: usize, total: usize, archive: &str) -> ProgressEvent {
    ProgressEvent {
        completed,
        total,
        current_archive: archive.to_string(),
    }
}

fn report(archives: &[&str]) -> AuditReport {
    let profiles = GameProfiles::builtin();
    let issues: Vec<ArchiveIssue> = archives
        .iter()
        .map(|name| ArchiveIssue {
            archive_file_name: name.to_string(),
            detected_version: 104,
            expected_version: 105,
            owning_plugin: None,
            owning_mod: None,
        })
        .collect();
    AuditReport::build(&issues, profiles.lookup("skyrimse").unwrap(), &profiles)
}

#[tokio::test]
async fn test_state_change_events_emitted() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.begin_batch("skyrimse");

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert!(
        matches!(event, StateChange::BatchStarted { ref game_id } if game_id == "skyrimse"),
        "Expected BatchStarted event, got: {:?}",
        event
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();
    let mut rx3 = state.subscribe();

    state.show_progress(&progress(0, 3, "a.bsa"));

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout")
            .expect("Channel closed");
        assert!(matches!(event, StateChange::ProgressUpdated { progress: 0, .. }));
    }
}

#[tokio::test]
async fn test_batch_workflow_events() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    let sink: &dyn ProgressSink = &*state;
    state.begin_batch("skyrimse");
    sink.progress(&progress(0, 2, "a.bsa"));
    sink.progress(&progress(1, 2, "b.bsa"));
    sink.finished();
    state.finish_batch(Some(&report(&["b.bsa"])));

    let mut events = Vec::new();
    while let Ok(Ok(event)) = timeout(Duration::from_millis(100), rx.recv()).await {
        events.push(event);
        if matches!(events.last(), Some(StateChange::BatchFinished { .. })) {
            break;
        }
    }

    assert_eq!(
        events,
        vec![
            StateChange::BatchStarted {
                game_id: "skyrimse".to_string()
            },
            StateChange::ProgressUpdated {
                id: "archive-version-check".to_string(),
                progress: 0,
                message: "a.bsa".to_string(),
            },
            StateChange::ProgressUpdated {
                id: "archive-version-check".to_string(),
                progress: 50,
                message: "b.bsa".to_string(),
            },
            StateChange::ProgressDismissed {
                id: "archive-version-check".to_string()
            },
            StateChange::ResultShown {
                id: "archive-version-mismatch".to_string(),
                issue_count: 1,
            },
            StateChange::BatchFinished { issue_count: 1 },
        ]
    );
}

#[tokio::test]
async fn test_new_result_replaces_old_one() {
    let state = Arc::new(StateManager::new());

    state.finish_batch(Some(&report(&["old.bsa"])));
    state.finish_batch(Some(&report(&["new.bsa", "other.bsa"])));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.issue_count, 2);
    assert!(snapshot.result.unwrap().message.starts_with("2 archive(s)"));

    let details = state.show_details().unwrap();
    assert!(details.contains("new.bsa"));
    assert!(!details.contains("old.bsa"));
}

#[tokio::test]
async fn test_same_count_new_report_still_emits() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.finish_batch(Some(&report(&["a.bsa"])));
    state.finish_batch(Some(&report(&["b.bsa"])));

    let mut shown = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, StateChange::ResultShown { .. }) {
            shown += 1;
        }
    }
    assert_eq!(shown, 2);
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());

    let mut handles = vec![];

    for i in 0..10 {
        let state_clone = state.clone();
        let handle = tokio::spawn(async move {
            state_clone.show_progress(&progress(i, 10, &format!("{i}.bsa")));
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // Last write wins, the slot holds exactly one notification
    let progress = state.read(|s| s.checking.as_ref().map(|c| c.progress));
    assert!(matches!(progress, Some(p) if p < 100));
}

#[tokio::test]
async fn test_dismissed_result_has_no_details() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.finish_batch(Some(&report(&["a.bsa"])));
    state.dismiss_result();

    let mut found_dismissed = false;
    for _ in 0..5 {
        match timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Ok(StateChange::ResultDismissed { .. })) => {
                found_dismissed = true;
                break;
            }
            Ok(Ok(_)) => continue,
            _ => break,
        }
    }

    assert!(found_dismissed, "Expected ResultDismissed event");
    assert!(state.show_details().is_none());
}
