//! Synchronization helpers against the simulator's lagging localStorage

use todomvc_e2e::simulator::{SimulatorOptions, TodoMvcSimulator};
use todomvc_e2e::{E2eError, HarnessConfig, StorageObservation, TodoPage, WaitOptions};

fn page_with(options: SimulatorOptions, timeout_ms: u64) -> TodoPage<TodoMvcSimulator> {
    let config = HarnessConfig {
        wait: WaitOptions::default()
            .with_timeout(timeout_ms)
            .with_poll_interval(5),
        ..Default::default()
    };
    TodoPage::new(TodoMvcSimulator::new(options), &config)
}

fn lagging(reads: usize) -> SimulatorOptions {
    SimulatorOptions {
        persist_after_reads: reads,
        ..Default::default()
    }
}

#[tokio::test]
async fn waits_out_the_persistence_lag() {
    let page = page_with(lagging(5), 1_000);
    page.navigate().await.unwrap();
    page.add_item("feed the cat").await.unwrap();

    // The write has not landed yet
    assert!(matches!(
        page.storage().observe().await.unwrap(),
        StorageObservation::Missing
    ));

    let snapshot = page.storage().wait_for_total_count(1).await.unwrap();
    assert_eq!(snapshot.titles(), vec!["feed the cat"]);
}

#[tokio::test]
async fn completed_count_tracks_toggles() {
    let page = page_with(lagging(2), 1_000);
    page.navigate().await.unwrap();
    for item in ["a", "b", "c"] {
        page.add_item(item).await.unwrap();
    }
    page.toggle_complete_all().await.unwrap();
    page.storage().wait_for_completed_count(3).await.unwrap();

    page.toggle_complete("b").await.unwrap();
    let snapshot = page.storage().wait_for_completed_count(2).await.unwrap();
    assert_eq!(snapshot.total_count(), 3);
}

#[tokio::test]
async fn timeout_names_the_predicate_and_last_observation() {
    let page = page_with(lagging(2), 1_000);
    page.navigate().await.unwrap();
    page.add_item("feed the cat").await.unwrap();

    let err = page
        .storage()
        .with_options(WaitOptions::default().with_timeout(50).with_poll_interval(5))
        .wait_for_total_count(3)
        .await
        .unwrap_err();

    match &err {
        E2eError::Timeout {
            waited_for,
            last_observed,
            timeout_ms,
        } => {
            assert!(waited_for.contains("3 todo(s)"), "{waited_for}");
            assert!(last_observed.contains("feed the cat"), "{last_observed}");
            assert_eq!(*timeout_ms, 50);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(!err.is_domain_error());
}

#[tokio::test]
async fn malformed_storage_never_satisfies_a_predicate() {
    let config = HarnessConfig {
        wait: WaitOptions::default().with_timeout(30).with_poll_interval(5),
        ..Default::default()
    };
    let sim = TodoMvcSimulator::with_storage(SimulatorOptions::default(), "not json");
    let page = TodoPage::new(sim, &config);

    let err = page.storage().wait_for_total_count(0).await.unwrap_err();
    match err {
        E2eError::Timeout { last_observed, .. } => {
            assert!(last_observed.contains("not json"), "{last_observed}")
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn reload_restores_persisted_list() {
    let page = page_with(lagging(3), 1_000);
    page.navigate().await.unwrap();
    page.add_item("buy some cheese").await.unwrap();
    page.add_item("feed the cat").await.unwrap();
    page.toggle_complete("feed the cat").await.unwrap();
    page.storage().wait_for_completed_count(1).await.unwrap();

    page.navigate().await.unwrap();

    assert_eq!(
        page.item_texts().await.unwrap(),
        vec!["buy some cheese", "feed the cat"]
    );
    assert_eq!(page.completion_markers().await.unwrap(), vec![false, true]);
}
