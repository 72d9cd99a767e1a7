//! Per-item deletion and batch reports

mod common;

use common::{create_message, not_found, server_error, MockGmailClient};
use google_cleanup::client::ProgressCallback;
use google_cleanup::executor::ActionExecutor;
use google_cleanup::models::GmailMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn staged() -> Vec<GmailMessage> {
    vec![
        create_message("m1", "a@ads.com", 10),
        create_message("m2", "b@ads.com", 20),
        create_message("m3", "c@ads.com", 30),
    ]
}

#[test]
fn test_delete_returns_true_on_success() {
    let mut client = MockGmailClient::new();
    client
        .expect_delete()
        .withf(|id| id == "m1")
        .times(1)
        .returning(|_| Ok(()));

    let executor = ActionExecutor::new(&client);
    assert!(tokio_test::block_on(executor.delete("m1")));
}

#[tokio::test]
async fn test_delete_turns_errors_into_false() {
    let mut client = MockGmailClient::new();
    client.expect_delete().returning(|id| Err(not_found(id)));

    let executor = ActionExecutor::new(&client);
    assert!(!executor.delete("gone").await);
}

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let mut client = MockGmailClient::new();
    client.expect_delete().times(3).returning(|id| {
        if id == "m2" {
            Err(server_error())
        } else {
            Ok(())
        }
    });

    let report = ActionExecutor::new(&client)
        .delete_all(&staged(), None)
        .await;

    assert_eq!(report.deleted, vec!["m1".to_string(), "m3".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "m2");
    assert!(report.failed[0].1.contains("500"));
    assert_eq!(report.attempted(), 3);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_batch_reports_progress() {
    let mut client = MockGmailClient::new();
    client.expect_delete().returning(|_| Ok(()));

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);
    let progress: ProgressCallback = Arc::new(move || {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });

    let report = ActionExecutor::new(&client)
        .delete_all(&staged(), Some(progress))
        .await;
    assert!(report.is_clean());
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    let mut client = MockGmailClient::new();
    client.expect_delete().never();

    let executor = ActionExecutor::new(&client).with_dry_run(true);
    assert!(executor.is_dry_run());

    let report = executor.delete_all(&staged(), None).await;
    assert_eq!(report.deleted.len(), 3);
    assert!(report.failed.is_empty());
    assert!(report.dry_run);
}

#[tokio::test]
async fn test_real_run_is_not_marked_dry() {
    let mut client = MockGmailClient::new();
    client.expect_delete().returning(|_| Ok(()));

    let report = ActionExecutor::new(&client)
        .delete_all(&staged(), None)
        .await;
    assert!(!report.dry_run);
}

#[tokio::test]
async fn test_preview_needs_no_client() {
    let executor = ActionExecutor::preview();
    assert!(executor.is_dry_run());
    assert!(executor.delete("m1").await);

    let report = executor.delete_all(&staged(), None).await;
    assert!(report.dry_run);
    assert_eq!(report.deleted, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn test_empty_batch() {
    let client = MockGmailClient::new();
    let report = ActionExecutor::new(&client)
        .delete_all::<GmailMessage>(&[], None)
        .await;
    assert_eq!(report.attempted(), 0);
}
