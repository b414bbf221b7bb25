//! Tests for the cancellable image generation supervisor.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use common::{eventually, GatedImageGenerator, USER};
use twai::{DomainError, Poll, Session, TaskState, TaskSupervisor};

fn supervisor(generator: &Arc<GatedImageGenerator>) -> TaskSupervisor {
    TaskSupervisor::new(generator.clone())
}

#[tokio::test]
async fn test_start_records_active_task() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);

    let handle = supervisor
        .start(&mut session, "a red fox")
        .expect("Failed to start task");

    assert_eq!(handle.prompt(), "a red fox");
    assert_eq!(handle.state(), TaskState::Pending);
    assert_eq!(session.active_task().map(|h| h.id()), Some(handle.id()));
}

#[tokio::test]
async fn test_second_start_is_rejected_while_active() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);

    let first = supervisor.start(&mut session, "one").expect("Failed to start task");
    let second = supervisor.start(&mut session, "two");

    assert!(matches!(second, Err(DomainError::TaskAlreadyActive(_))));
    assert_eq!(session.active_task().map(|h| h.id()), Some(first.id()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_leave_one_active_task() {
    let generator = GatedImageGenerator::new();
    let supervisor = Arc::new(supervisor(&generator));
    let session = Arc::new(Mutex::new(Session::new(USER)));

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let supervisor = Arc::clone(&supervisor);
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut session = session.lock().await;
                supervisor.start(&mut session, &format!("prompt {i}")).is_ok()
            })
        })
        .collect();

    let mut started = 0;
    for attempt in attempts {
        if attempt.await.expect("Task panicked") {
            started += 1;
        }
    }

    assert_eq!(started, 1);
    assert!(session.lock().await.has_active_task());
    eventually("the generator to be called", || generator.calls() == 1).await;
}

#[tokio::test]
async fn test_expired_polls_do_not_disturb_the_task() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "slow").expect("Failed to start task");

    for _ in 0..5 {
        let poll = supervisor.poll(&handle, Duration::from_millis(5)).await;
        assert_eq!(poll, Poll::Pending);
    }
    assert!(!handle.cancellation_requested());

    generator.release(Some(vec![1, 2, 3]));
    let poll = supervisor.wait(&handle).await;

    assert_eq!(poll, Poll::Completed(Some(vec![1, 2, 3])));
    assert_eq!(handle.state(), TaskState::Succeeded(vec![1, 2, 3]));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_generator_without_image_completes_empty() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "rejected").expect("Failed to start task");

    generator.release(None);

    assert_eq!(supervisor.wait(&handle).await, Poll::Completed(None));
    assert_eq!(handle.state(), TaskState::Failed);
}

#[tokio::test]
async fn test_cancel_stops_a_pending_task() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "sunset").expect("Failed to start task");

    supervisor.cancel(&handle);

    assert_eq!(supervisor.wait(&handle).await, Poll::Cancelled);
    assert_eq!(handle.state(), TaskState::Cancelled);
    assert!(handle.cancellation_requested());
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "sunset").expect("Failed to start task");

    assert!(supervisor.cancel_active(&session));
    assert!(supervisor.cancel_active(&session));
    supervisor.cancel(&handle);

    assert_eq!(supervisor.wait(&handle).await, Poll::Cancelled);
    supervisor.cancel(&handle);
    assert_eq!(handle.state(), TaskState::Cancelled);
}

#[tokio::test]
async fn test_cancel_after_success_keeps_the_result() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "done").expect("Failed to start task");

    generator.release(Some(vec![9]));
    assert_eq!(supervisor.wait(&handle).await, Poll::Completed(Some(vec![9])));

    supervisor.cancel(&handle);

    assert!(!handle.cancellation_requested());
    assert_eq!(handle.state(), TaskState::Succeeded(vec![9]));
}

#[tokio::test]
async fn test_cancel_active_without_task_reports_nothing() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let session = Session::new(USER);

    assert!(!supervisor.cancel_active(&session));
}

#[tokio::test]
async fn test_release_clears_the_slot_exactly_once() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let handle = supervisor.start(&mut session, "once").expect("Failed to start task");
    generator.release(Some(vec![1]));
    supervisor.wait(&handle).await;

    assert!(supervisor.release(&mut session, &handle));
    assert!(!supervisor.release(&mut session, &handle));
    assert!(!session.has_active_task());

    let next = supervisor.start(&mut session, "twice");
    assert!(next.is_ok(), "A released slot should accept a new task");
}

#[tokio::test]
async fn test_release_ignores_a_stale_handle() {
    let generator = GatedImageGenerator::new();
    let supervisor = supervisor(&generator);
    let mut session = Session::new(USER);
    let old = supervisor.start(&mut session, "old").expect("Failed to start task");
    supervisor.cancel(&old);
    supervisor.wait(&old).await;
    assert!(supervisor.release(&mut session, &old));

    let current = supervisor.start(&mut session, "new").expect("Failed to start task");

    assert!(!supervisor.release(&mut session, &old));
    assert_eq!(session.active_task().map(|h| h.id()), Some(current.id()));
}
