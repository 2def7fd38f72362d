use std::sync::Arc;

use storyloom::jobs::{JobError, JobRegistry};

#[test]
fn create_job_registers_pending_state() {
    let registry = JobRegistry::new();
    let id = registry.create_job();

    let job = registry.get(id).expect("job just created");
    assert_eq!(job.id, id);
    assert_eq!(job.progress, 0);
    assert!(!job.completed);
    assert!(job.error.is_none());
    assert!(!job.is_terminal());
}

#[test]
fn get_unknown_job_is_none() {
    let registry = JobRegistry::new();
    let id = registry.create_job();
    registry.remove(id);
    assert!(registry.get(id).is_none());
}

#[test]
fn update_records_progress_and_message() {
    let registry = JobRegistry::new();
    let id = registry.create_job();

    registry.update(id, 40, "Deriving realm tiers...").unwrap();
    let job = registry.get(id).unwrap();
    assert_eq!(job.progress, 40);
    assert_eq!(job.message, "Deriving realm tiers...");
    assert!(!job.is_terminal());
}

#[test]
fn complete_marks_terminal_with_full_progress() {
    let registry = JobRegistry::new();
    let id = registry.create_job();

    registry.complete(id, "done").unwrap();
    let job = registry.get(id).unwrap();
    assert_eq!(job.progress, 100);
    assert!(job.completed);
    assert!(job.error.is_none());
    assert!(job.is_terminal());
}

#[test]
fn fail_records_error_and_completes() {
    let registry = JobRegistry::new();
    let id = registry.create_job();

    registry
        .fail(id, "Generation failed while working on realms", "boom")
        .unwrap();
    let job = registry.get(id).unwrap();
    assert!(job.completed);
    assert_eq!(job.error.as_deref(), Some("boom"));
    assert!(job.is_terminal());
}

#[test]
fn terminal_state_is_sticky() {
    let registry = JobRegistry::new();
    let id = registry.create_job();
    registry.complete(id, "done").unwrap();

    registry.update(id, 10, "late straggler").unwrap();
    registry.fail(id, "late failure", "nope").unwrap();

    let job = registry.get(id).unwrap();
    assert_eq!(job.progress, 100);
    assert_eq!(job.message, "done");
    assert!(job.error.is_none());
}

#[test]
fn update_unknown_job_errors() {
    let registry = JobRegistry::new();
    let id = registry.create_job();
    registry.remove(id);

    let err = registry.update(id, 50, "ghost").unwrap_err();
    assert!(matches!(err, JobError::NotFound { .. }));
}

#[test]
fn out_of_order_progress_is_stored_verbatim() {
    // The registry keeps the informational contract: no server-side clamping.
    let registry = JobRegistry::new();
    let id = registry.create_job();

    registry.update(id, 80, "almost").unwrap();
    registry.update(id, 30, "actually not").unwrap();
    assert_eq!(registry.get(id).unwrap().progress, 30);
}

#[test]
fn prune_terminal_keeps_active_jobs() {
    let registry = JobRegistry::new();
    let active = registry.create_job();
    let finished = registry.create_job();
    registry.complete(finished, "done").unwrap();

    let removed = registry.prune_terminal(chrono::Duration::zero());
    assert_eq!(removed, 1);
    assert!(registry.get(active).is_some());
    assert!(registry.get(finished).is_none());

    // A generous age keeps even terminal jobs around.
    registry.complete(active, "done").unwrap();
    assert_eq!(registry.prune_terminal(chrono::Duration::hours(1)), 0);
}

#[test]
fn readers_never_observe_torn_snapshots() {
    // The writer keeps message and progress in lockstep; any torn read would
    // surface as a mismatched pair.
    let registry = Arc::new(JobRegistry::new());
    let id = registry.create_job();
    registry.update(id, 0, "step 0").unwrap();

    std::thread::scope(|scope| {
        let writer_registry = Arc::clone(&registry);
        scope.spawn(move || {
            for step in 1..=100u8 {
                writer_registry
                    .update(id, step, format!("step {step}"))
                    .unwrap();
            }
            writer_registry.complete(id, "step 100").unwrap();
        });

        let reader_registry = Arc::clone(&registry);
        scope.spawn(move || {
            loop {
                let job = reader_registry.get(id).expect("job exists");
                if job.completed {
                    break;
                }
                assert_eq!(job.message, format!("step {}", job.progress));
            }
        });
    });
}
