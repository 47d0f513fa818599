//! Scenario catalog for the TodoMVC application
//!
//! Every scenario starts on a freshly navigated, empty list.

use futures::future::BoxFuture;
use std::fmt::Debug;

use crate::driver::PageDriver;
use crate::error::{E2eError, E2eResult};
use crate::expect::expect;
use crate::model::{Filter, Item};
use crate::page::TodoPage;

pub const TODO_ITEMS: [&str; 3] = [
    "buy some cheese",
    "feed the cat",
    "book a doctors appointment",
];

pub type ScenarioFn<D> = for<'a> fn(&'a TodoPage<D>) -> BoxFuture<'a, E2eResult<()>>;

/// A named, tagged scenario
pub struct Scenario<D> {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub run: ScenarioFn<D>,
}

impl<D> Scenario<D> {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

// Fn pointers are Copy regardless of D
impl<D> Clone for Scenario<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Scenario<D> {}

pub fn catalog<D: PageDriver>() -> Vec<Scenario<D>> {
    macro_rules! scenario {
        ($f:ident, [$($tag:literal),*]) => {
            Scenario { name: stringify!($f), tags: &[$($tag),*], run: $f::<D> }
        };
    }

    vec![
        scenario!(should_allow_me_to_add_todo_items, ["new-todo", "smoke"]),
        scenario!(should_clear_text_input_field_when_an_item_is_added, ["new-todo"]),
        scenario!(should_append_new_items_to_the_bottom_of_the_list, ["new-todo", "smoke"]),
        scenario!(should_allow_me_to_mark_all_items_as_completed, ["mark-all"]),
        scenario!(should_allow_me_to_clear_the_complete_state_of_all_items, ["mark-all"]),
        scenario!(complete_all_checkbox_should_update_state_when_items_are_completed_or_cleared, ["mark-all"]),
        scenario!(mark_all_from_mixed_state_completes_everything, ["mark-all"]),
        scenario!(should_allow_me_to_edit_an_item, ["editing", "smoke"]),
        scenario!(should_trim_entered_text_when_editing, ["editing"]),
        scenario!(should_remove_the_item_if_an_empty_text_string_was_entered, ["editing"]),
        scenario!(should_cancel_edits_on_escape, ["editing"]),
        scenario!(should_hide_other_controls_when_editing, ["editing"]),
        scenario!(should_save_edits_on_blur, ["editing"]),
        scenario!(should_remove_a_single_item, ["remove"]),
        scenario!(should_remove_all_items, ["remove"]),
        scenario!(unknown_items_are_reported_by_text, ["remove", "errors"]),
        scenario!(should_allow_me_to_display_filtered_items, ["filters", "smoke"]),
        scenario!(filter_round_trip_preserves_the_list, ["filters"]),
        scenario!(should_open_a_filtered_view_from_its_route, ["filters"]),
        scenario!(should_remove_completed_items_when_clear_is_clicked, ["clear-completed"]),
        scenario!(clear_completed_requires_a_completed_item, ["clear-completed", "errors"]),
        scenario!(should_display_the_current_number_of_todo_items, ["counter"]),
        scenario!(should_persist_its_data, ["persistence"]),
    ]
}

fn ensure_eq<T: PartialEq + Debug>(what: &str, expected: T, actual: T) -> E2eResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed {
            expected: format!("{} = {:?}", what, expected),
            actual: format!("{:?}", actual),
        })
    }
}

async fn create_default_todos<D: PageDriver>(page: &TodoPage<D>) -> E2eResult<()> {
    for item in TODO_ITEMS {
        page.add_item(item).await?;
    }
    expect(page).to_have_count(TODO_ITEMS.len()).await
}

fn should_allow_me_to_add_todo_items<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        page.add_item(TODO_ITEMS[0]).await?;
        expect(page).to_have_texts(&[TODO_ITEMS[0]]).await?;

        page.add_item(TODO_ITEMS[1]).await?;
        expect(page).to_have_texts(&TODO_ITEMS[..2]).await?;

        page.storage().wait_for_total_count(2).await?;
        Ok(())
    })
}

fn should_clear_text_input_field_when_an_item_is_added<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        page.add_item(TODO_ITEMS[0]).await?;
        expect(page).to_have_empty_input().await?;
        page.storage().wait_for_total_count(1).await?;
        Ok(())
    })
}

fn should_append_new_items_to_the_bottom_of_the_list<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;

        expect(page).to_have_remaining_label("3 items left").await?;
        ensure_eq("remaining count", 3, page.remaining_count().await?)?;
        expect(page).to_have_texts(&TODO_ITEMS).await?;

        let snapshot = page.storage().wait_for_total_count(3).await?;
        ensure_eq("persisted titles", TODO_ITEMS.to_vec(), snapshot.titles())?;
        Ok(())
    })
}

fn should_allow_me_to_mark_all_items_as_completed<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete_all().await?;

        expect(page)
            .to_have_classes(&["completed", "completed", "completed"])
            .await?;
        page.storage().wait_for_completed_count(3).await?;
        Ok(())
    })
}

fn should_allow_me_to_clear_the_complete_state_of_all_items<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        let before = page.completion_markers().await?;

        page.toggle_complete_all().await?;
        page.toggle_complete_all().await?;

        expect(page).to_have_classes(&["", "", ""]).await?;
        expect(page).to_have_completion_markers(&before).await?;
        page.storage().wait_for_completed_count(0).await?;
        Ok(())
    })
}

fn complete_all_checkbox_should_update_state_when_items_are_completed_or_cleared<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete_all().await?;
        expect(page).to_have_mark_all_checked(true).await?;
        page.storage().wait_for_completed_count(3).await?;

        page.toggle_complete(TODO_ITEMS[0]).await?;
        expect(page).to_have_mark_all_checked(false).await?;
        ensure_eq("first item complete", false, page.is_complete(TODO_ITEMS[0]).await?)?;

        page.toggle_complete(TODO_ITEMS[0]).await?;
        page.storage().wait_for_completed_count(3).await?;
        expect(page).to_have_mark_all_checked(true).await?;
        ensure_eq("first item complete", true, page.is_complete(TODO_ITEMS[0]).await?)?;
        Ok(())
    })
}

fn mark_all_from_mixed_state_completes_everything<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete(TODO_ITEMS[1]).await?;
        expect(page)
            .to_have_completion_markers(&[false, true, false])
            .await?;

        page.toggle_complete_all().await?;
        expect(page).to_have_completion_markers(&[true, true, true]).await?;
        page.storage().wait_for_completed_count(3).await?;
        Ok(())
    })
}

fn should_allow_me_to_edit_an_item<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.edit_item(TODO_ITEMS[1], "buy some sausages").await?;

        expect(page)
            .to_have_texts(&[TODO_ITEMS[0], "buy some sausages", TODO_ITEMS[2]])
            .await?;
        page.storage()
            .wait_for_item_title_present("buy some sausages")
            .await?;
        Ok(())
    })
}

fn should_trim_entered_text_when_editing<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.edit_item(TODO_ITEMS[1], "    buy some sausages    ").await?;

        expect(page)
            .to_have_texts(&[TODO_ITEMS[0], "buy some sausages", TODO_ITEMS[2]])
            .await?;
        page.storage()
            .wait_for_item_title_present("buy some sausages")
            .await?;
        Ok(())
    })
}

fn should_remove_the_item_if_an_empty_text_string_was_entered<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.edit_item(TODO_ITEMS[1], "").await?;

        expect(page).to_have_texts(&[TODO_ITEMS[0], TODO_ITEMS[2]]).await?;
        page.storage().wait_for_total_count(2).await?;
        Ok(())
    })
}

fn should_cancel_edits_on_escape<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        let session = page.begin_edit(TODO_ITEMS[1]).await?;
        session.fill("buy some sausages").await?;
        session.cancel().await?;

        expect(page).to_have_texts(&TODO_ITEMS).await?;
        Ok(())
    })
}

fn should_hide_other_controls_when_editing<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        let session = page.begin_edit(TODO_ITEMS[1]).await?;

        ensure_eq("edited item controls visible", false, session.item_controls_visible().await?)?;
        ensure_eq("pending text", TODO_ITEMS[1].to_string(), session.pending_text().await?)?;
        session.cancel().await?;

        expect(page).to_have_texts(&TODO_ITEMS).await?;
        Ok(())
    })
}

fn should_save_edits_on_blur<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        let session = page.begin_edit(TODO_ITEMS[1]).await?;
        session.fill("buy some sausages").await?;
        session.commit_by_blur().await?;

        expect(page)
            .to_have_texts(&[TODO_ITEMS[0], "buy some sausages", TODO_ITEMS[2]])
            .await?;
        page.storage()
            .wait_for_item_title_present("buy some sausages")
            .await?;
        Ok(())
    })
}

fn should_remove_a_single_item<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.remove_item(TODO_ITEMS[1]).await?;

        expect(page).to_have_texts(&[TODO_ITEMS[0], TODO_ITEMS[2]]).await?;
        page.storage().wait_for_total_count(2).await?;
        Ok(())
    })
}

fn should_remove_all_items<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.remove_all_items().await?;

        expect(page).to_have_count(0).await?;
        page.storage().wait_for_total_count(0).await?;
        Ok(())
    })
}

fn unknown_items_are_reported_by_text<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;

        let missing = "walk the dog";
        let outcomes = [
            page.remove_item(missing).await,
            page.edit_item(missing, "walk the cat").await,
            page.toggle_complete(missing).await,
            page.is_complete(missing).await.map(|_| ()),
        ];
        for outcome in outcomes {
            match outcome {
                Err(E2eError::NotFound { text }) if text == missing => {}
                other => {
                    return Err(E2eError::AssertionFailed {
                        expected: format!("NotFound {{ text: {:?} }}", missing),
                        actual: format!("{:?}", other),
                    })
                }
            }
        }

        expect(page).to_have_texts(&TODO_ITEMS).await?;
        Ok(())
    })
}

fn should_allow_me_to_display_filtered_items<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete(TODO_ITEMS[1]).await?;
        page.storage().wait_for_completed_count(1).await?;

        page.set_filter(Filter::Active).await?;
        expect(page).to_have_active_filter(Filter::Active).await?;
        expect(page).to_have_texts(&[TODO_ITEMS[0], TODO_ITEMS[2]]).await?;

        page.set_filter(Filter::Completed).await?;
        expect(page).to_have_active_filter(Filter::Completed).await?;
        expect(page).to_have_texts(&[TODO_ITEMS[1]]).await?;

        page.set_filter(Filter::All).await?;
        expect(page).to_have_active_filter(Filter::All).await?;
        expect(page).to_have_texts(&TODO_ITEMS).await?;

        let snapshot = page.storage().wait_for_total_count(3).await?;
        ensure_eq("persisted titles", TODO_ITEMS.to_vec(), snapshot.titles())?;
        Ok(())
    })
}

fn filter_round_trip_preserves_the_list<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete(TODO_ITEMS[0]).await?;
        expect(page)
            .to_have_completion_markers(&[true, false, false])
            .await?;
        let before = page.item_texts().await?;

        for filter in [Filter::Active, Filter::Completed, Filter::All] {
            page.set_filter(filter).await?;
            expect(page).to_have_active_filter(filter).await?;
        }

        expect(page).to_have_texts(&before[..]).await?;
        expect(page)
            .to_have_completion_markers(&[true, false, false])
            .await?;
        Ok(())
    })
}

fn should_open_a_filtered_view_from_its_route<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete(TODO_ITEMS[1]).await?;
        page.storage().wait_for_completed_count(1).await?;

        page.navigate_filtered(Filter::Completed).await?;
        expect(page).to_have_active_filter(Filter::Completed).await?;
        expect(page).to_have_texts(&[TODO_ITEMS[1]]).await?;
        Ok(())
    })
}

fn should_remove_completed_items_when_clear_is_clicked<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;
        page.toggle_complete(TODO_ITEMS[1]).await?;
        ensure_eq("clear completed visible", true, page.is_clear_completed_visible().await?)?;

        page.clear_completed().await?;

        expect(page).to_have_texts(&[TODO_ITEMS[0], TODO_ITEMS[2]]).await?;
        ensure_eq("clear completed visible", false, page.is_clear_completed_visible().await?)?;
        page.storage().wait_for_total_count(2).await?;
        Ok(())
    })
}

fn clear_completed_requires_a_completed_item<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        create_default_todos(page).await?;

        match page.clear_completed().await {
            Err(E2eError::PreconditionViolated { .. }) => {}
            other => {
                return Err(E2eError::AssertionFailed {
                    expected: "PreconditionViolated".to_string(),
                    actual: format!("{:?}", other),
                })
            }
        }

        expect(page).to_have_texts(&TODO_ITEMS).await?;
        Ok(())
    })
}

fn should_display_the_current_number_of_todo_items<D: PageDriver>(
    page: &TodoPage<D>,
) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        page.add_item(TODO_ITEMS[0]).await?;
        expect(page).to_have_remaining_label("1 item left").await?;

        page.add_item(TODO_ITEMS[1]).await?;
        expect(page).to_have_remaining_label("2 items left").await?;

        page.toggle_complete(TODO_ITEMS[0]).await?;
        expect(page).to_have_remaining_label("1 item left").await?;
        page.storage().wait_for_total_count(2).await?;
        Ok(())
    })
}

fn should_persist_its_data<D: PageDriver>(page: &TodoPage<D>) -> BoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        page.add_item(TODO_ITEMS[0]).await?;
        page.add_item(TODO_ITEMS[1]).await?;
        page.toggle_complete(TODO_ITEMS[0]).await?;
        let snapshot = page.storage().wait_for_completed_count(1).await?;
        ensure_eq(
            "persisted items",
            vec![
                Item { text: TODO_ITEMS[0].to_string(), completed: true, order: 0 },
                Item { text: TODO_ITEMS[1].to_string(), completed: false, order: 1 },
            ],
            snapshot.items(),
        )?;

        page.navigate().await?;

        expect(page).to_have_texts(&TODO_ITEMS[..2]).await?;
        expect(page).to_have_completion_markers(&[true, false]).await?;
        Ok(())
    })
}
