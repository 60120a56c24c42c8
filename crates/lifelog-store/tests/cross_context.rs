//! Integration tests for change propagation between contexts.
//!
//! Two handles of one store stand in for two browser tabs: a write through
//! one must refresh the other's live queries without the other doing
//! anything.

use std::sync::Arc;

use lifelog::{GoalCategory, MonthlyGoal, Todo, TodoDraft};
use lifelog_store::{BackingStore, Collection, LiveQuery, LocalData, MemoryStore, Phase};
use serde_json::json;

fn two_tabs() -> (Arc<MemoryStore>, Arc<MemoryStore>) {
    let a = Arc::new(MemoryStore::new());
    let b = Arc::new(a.fork_context());
    (a, b)
}

#[test]
fn write_in_one_tab_refreshes_the_other() {
    let (a, b) = two_tabs();
    let tab_a = LocalData::builder_shared(Arc::clone(&a)).build();
    let tab_b = LocalData::builder_shared(Arc::clone(&b)).build();

    let live = LiveQuery::activate(tab_b.todos.clone(), &*b);
    assert_eq!(live.phase(), Phase::Ready);
    assert!(live.snapshot().is_empty());

    let milk = tab_a.todos.create(TodoDraft::new("Buy milk")).unwrap();
    assert_eq!(live.snapshot(), vec![milk.clone()]);

    tab_a
        .todos
        .update(&milk.id, &json!({ "completed": true }))
        .unwrap();
    assert!(live.snapshot()[0].completed);

    tab_a.todos.delete(&milk.id).unwrap();
    assert!(live.snapshot().is_empty());
    assert_eq!(live.generation(), 4);
}

#[test]
fn settings_follow_the_other_tab() {
    let (a, b) = two_tabs();
    let tab_a = LocalData::builder_shared(Arc::clone(&a)).build();
    let tab_b = LocalData::builder_shared(Arc::clone(&b)).build();

    let live = LiveQuery::activate(tab_b.settings.clone(), &*b);
    assert_eq!(live.snapshot().theme_color, "pink");

    tab_a.settings.update(&json!({ "themeColor": "navy" })).unwrap();
    assert_eq!(live.snapshot().theme_color, "navy");

    tab_a.settings.reset().unwrap();
    assert_eq!(live.snapshot().theme_color, "pink");
}

#[test]
fn many_listeners_in_many_tabs() {
    let a = Arc::new(MemoryStore::new());
    let tabs: Vec<Arc<MemoryStore>> = (0..4).map(|_| Arc::new(a.fork_context())).collect();
    let lives: Vec<_> = tabs
        .iter()
        .map(|t| LiveQuery::activate(Collection::<Todo, _>::new(Arc::clone(t)), &**t))
        .collect();

    Collection::<Todo, _>::new(Arc::clone(&a))
        .create(TodoDraft::new("shared"))
        .unwrap();
    for live in &lives {
        assert_eq!(live.snapshot().len(), 1);
    }
}

#[test]
fn migrating_read_in_one_tab_notifies_the_other() {
    let (a, b) = two_tabs();
    a.set(
        "monthlyGoals",
        &json!([{
            "id": "g1",
            "month": "2024-01",
            "activityGoal": "Win the match",
            "createdAt": "2024-01-01T00:00:00.000Z"
        }])
        .to_string(),
    )
    .unwrap();

    let tab_a = LocalData::builder_shared(Arc::clone(&a)).build();
    let tab_b = LocalData::builder_shared(Arc::clone(&b)).build();
    let raw_live = LiveQuery::activate(tab_b.monthly_goals.unmigrated().clone(), &*b);
    // Decoded without migration, the legacy goal is invisible.
    assert!(raw_live.snapshot()[0].goals.is_empty());

    // The first read in tab A writes the migrated shape back.
    let goals: Vec<MonthlyGoal> = tab_a.monthly_goals.get_all();
    assert_eq!(goals[0].goals.goals(GoalCategory::Activity), ["Win the match"]);

    let seen = raw_live.snapshot();
    assert_eq!(seen[0].goals.goals(GoalCategory::Activity), ["Win the match"]);
}

#[test]
fn dropped_live_query_stops_listening() {
    let (a, b) = two_tabs();
    let baseline = b.listener_count();
    let live = LiveQuery::activate(Collection::<Todo, _>::new(Arc::clone(&b)), &*b);
    assert_eq!(b.listener_count(), baseline + 1);
    live.deactivate();
    assert_eq!(a.listener_count(), baseline);

    Collection::<Todo, _>::new(a).create(TodoDraft::new("x")).unwrap();
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use lifelog_store::SqliteStore;

    #[test]
    fn forked_sqlite_handles_refresh_each_other() {
        let a = Arc::new(SqliteStore::open_in_memory().unwrap());
        let b = Arc::new(a.fork_context());
        let live = LiveQuery::activate(Collection::<Todo, _>::new(Arc::clone(&b)), &*b);

        Collection::<Todo, _>::new(a)
            .create(TodoDraft::new("from sqlite"))
            .unwrap();
        assert_eq!(live.snapshot()[0].text, "from sqlite");
    }
}
