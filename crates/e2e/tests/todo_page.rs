//! Page object behavior against the in-process simulator

use test_case::test_case;
use todomvc_e2e::simulator::{SimulatorOptions, TodoMvcSimulator};
use todomvc_e2e::{expect, E2eError, Filter, HarnessConfig, TodoPage, WaitOptions};

const TODO_ITEMS: [&str; 3] = ["buy some cheese", "feed the cat", "book a doctors appointment"];

async fn open_page() -> TodoPage<TodoMvcSimulator> {
    let config = HarnessConfig {
        wait: WaitOptions::default().with_timeout(1_000).with_poll_interval(5),
        ..Default::default()
    };
    let page = TodoPage::new(TodoMvcSimulator::new(SimulatorOptions::default()), &config);
    page.navigate().await.unwrap();
    page
}

async fn open_page_with_defaults() -> TodoPage<TodoMvcSimulator> {
    let page = open_page().await;
    for item in TODO_ITEMS {
        page.add_item(item).await.unwrap();
    }
    page
}

#[test_case(&["one"]; "single item")]
#[test_case(&["b", "a", "c"]; "unsorted order kept")]
#[test_case(&["same", "same"]; "duplicate texts")]
#[tokio::test]
async fn added_items_render_in_call_order(items: &[&str]) {
    let page = open_page().await;
    for item in items {
        page.add_item(item).await.unwrap();
        assert_eq!(page.input_value().await.unwrap(), "");
    }
    assert_eq!(page.item_texts().await.unwrap(), items);
    assert_eq!(page.item_count().await.unwrap(), items.len());
}

#[tokio::test]
async fn toggle_all_twice_restores_uniform_state() {
    let page = open_page_with_defaults().await;
    page.toggle_complete_all().await.unwrap();
    let completed = page.completion_markers().await.unwrap();

    page.toggle_complete_all().await.unwrap();
    page.toggle_complete_all().await.unwrap();

    assert_eq!(page.completion_markers().await.unwrap(), completed);
    assert_eq!(completed, vec![true; 3]);
}

#[tokio::test]
async fn toggle_all_from_mixed_state_converges_to_complete() {
    let page = open_page_with_defaults().await;
    page.toggle_complete(TODO_ITEMS[2]).await.unwrap();

    page.toggle_complete_all().await.unwrap();
    assert_eq!(page.completion_markers().await.unwrap(), vec![true; 3]);
    assert!(page.is_mark_all_checked().await.unwrap());
}

#[tokio::test]
async fn empty_edit_removes_only_the_matched_item() {
    let page = open_page_with_defaults().await;
    page.edit_item(TODO_ITEMS[0], "").await.unwrap();
    assert_eq!(page.item_texts().await.unwrap(), &TODO_ITEMS[1..]);
}

#[tokio::test]
async fn edit_stores_trimmed_text() {
    let page = open_page_with_defaults().await;
    page.edit_item(TODO_ITEMS[2], "  text  ").await.unwrap();

    let snapshot = page.storage().wait_for_item_title_present("text").await.unwrap();
    assert_eq!(snapshot.titles(), vec![TODO_ITEMS[0], TODO_ITEMS[1], "text"]);
}

#[tokio::test]
async fn cancelled_edit_leaves_item_in_place() {
    let page = open_page_with_defaults().await;
    let session = page.begin_edit(TODO_ITEMS[1]).await.unwrap();
    assert_eq!(session.index(), 1);
    session.fill("something else").await.unwrap();
    session.cancel().await.unwrap();

    assert_eq!(page.item_texts().await.unwrap(), TODO_ITEMS);
}

#[tokio::test]
async fn acting_elsewhere_commits_an_open_edit() {
    let page = open_page_with_defaults().await;
    let session = page.begin_edit(TODO_ITEMS[0]).await.unwrap();
    session.fill("buy some sausages").await.unwrap();
    drop(session);

    page.add_item("walk the dog").await.unwrap();
    assert_eq!(
        page.item_texts().await.unwrap(),
        vec!["buy some sausages", TODO_ITEMS[1], TODO_ITEMS[2], "walk the dog"]
    );
}

#[tokio::test]
async fn new_edit_targets_its_item_after_an_abandoned_empty_edit() {
    let page = open_page().await;
    for item in ["a", "b", "c"] {
        page.add_item(item).await.unwrap();
    }

    let abandoned = page.begin_edit("a").await.unwrap();
    abandoned.fill("").await.unwrap();
    drop(abandoned);

    // Committing the empty edit removes "a" and shifts "b" to the front
    let session = page.begin_edit("b").await.unwrap();
    assert_eq!(session.index(), 0);
    assert_eq!(session.pending_text().await.unwrap(), "b");
    session.fill("bee").await.unwrap();
    session.commit().await.unwrap();

    assert_eq!(page.item_texts().await.unwrap(), vec!["bee", "c"]);
}

#[tokio::test]
async fn remove_all_items_includes_items_hidden_by_the_filter() {
    let page = open_page().await;
    for item in ["a", "b", "c"] {
        page.add_item(item).await.unwrap();
    }
    page.toggle_complete("b").await.unwrap();
    page.set_filter(Filter::Active).await.unwrap();

    page.remove_all_items().await.unwrap();

    assert_eq!(page.item_count().await.unwrap(), 0);
    page.storage().wait_for_total_count(0).await.unwrap();

    // The view was left on All, so a new item is shown
    page.add_item("d").await.unwrap();
    assert_eq!(page.item_texts().await.unwrap(), vec!["d"]);
    assert_eq!(page.active_filter().await.unwrap(), Some(Filter::All));
}

#[tokio::test]
async fn clear_completed_removes_exactly_the_completed_items() {
    let page = open_page_with_defaults().await;
    page.add_item("walk the dog").await.unwrap();
    page.toggle_complete(TODO_ITEMS[0]).await.unwrap();
    page.toggle_complete(TODO_ITEMS[2]).await.unwrap();

    page.clear_completed().await.unwrap();

    assert_eq!(page.item_texts().await.unwrap(), vec![TODO_ITEMS[1], "walk the dog"]);
    assert_eq!(page.completion_markers().await.unwrap(), vec![false, false]);
}

#[tokio::test]
async fn clear_completed_without_completed_items_is_a_domain_error() {
    let page = open_page_with_defaults().await;
    let err = page.clear_completed().await.unwrap_err();

    assert!(matches!(err, E2eError::PreconditionViolated { .. }));
    assert!(err.is_domain_error());
    assert_eq!(page.item_texts().await.unwrap(), TODO_ITEMS);
}

#[tokio::test]
async fn rendered_count_matches_active_filter() {
    let page = open_page_with_defaults().await;
    page.toggle_complete(TODO_ITEMS[0]).await.unwrap();

    for (filter, expected) in [(Filter::Active, 2), (Filter::Completed, 1), (Filter::All, 3)] {
        page.set_filter(filter).await.unwrap();
        assert_eq!(page.active_filter().await.unwrap(), Some(filter));
        assert_eq!(page.item_count().await.unwrap(), expected, "filter {filter}");
    }
    assert_eq!(page.item_texts().await.unwrap(), TODO_ITEMS);
}

#[tokio::test]
async fn operations_on_hidden_items_report_not_found() {
    let page = open_page_with_defaults().await;
    page.toggle_complete(TODO_ITEMS[1]).await.unwrap();
    page.set_filter(Filter::Active).await.unwrap();

    let err = page.remove_item(TODO_ITEMS[1]).await.unwrap_err();
    assert!(err.to_string().contains(TODO_ITEMS[1]), "{err}");
    assert!(err.is_domain_error());
}

#[tokio::test]
async fn remove_item_on_duplicates_removes_the_first() {
    let page = open_page().await;
    for item in ["a", "b", "a"] {
        page.add_item(item).await.unwrap();
    }
    page.toggle_complete("a").await.unwrap();

    page.remove_item("a").await.unwrap();
    assert_eq!(page.item_texts().await.unwrap(), vec!["b", "a"]);
    assert_eq!(page.completion_markers().await.unwrap(), vec![false, false]);
}

#[tokio::test]
async fn remove_all_items_on_empty_list_is_a_no_op() {
    let page = open_page().await;
    page.remove_all_items().await.unwrap();
    assert_eq!(page.item_count().await.unwrap(), 0);
}

#[tokio::test]
async fn remaining_count_follows_active_items() {
    let page = open_page().await;
    assert_eq!(page.remaining_count().await.unwrap(), 0);

    page.add_item(TODO_ITEMS[0]).await.unwrap();
    assert_eq!(page.remaining_label().await.unwrap(), "1 item left");

    page.add_item(TODO_ITEMS[1]).await.unwrap();
    page.toggle_complete_all().await.unwrap();
    assert_eq!(page.remaining_count().await.unwrap(), 0);
    assert_eq!(page.remaining_label().await.unwrap(), "0 items left");
}

#[tokio::test]
async fn blank_input_is_not_added() {
    let page = open_page().await;
    page.add_item("   ").await.unwrap();
    assert_eq!(page.item_count().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_expectation_reports_expected_and_actual() {
    let page = open_page_with_defaults().await;
    let err = expect(&page)
        .to_have_texts(&["walk the dog"])
        .await
        .unwrap_err();

    match err {
        E2eError::AssertionFailed { expected, actual } => {
            assert!(expected.contains("walk the dog"));
            assert!(actual.contains(TODO_ITEMS[0]));
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
}
