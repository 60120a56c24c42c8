//! Two contexts sharing one store: a write in one refreshes the other.
//!
//! Run with: `cargo run -p lifelog-store --example two_tabs`

use std::sync::Arc;

use lifelog::{GoalCategory, GoalSheet, MonthlyGoalDraft, TodoDraft};
use lifelog_store::{LiveQuery, LocalData, MemoryStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tab_a = Arc::new(MemoryStore::new());
    let tab_b = Arc::new(tab_a.fork_context());

    let data_a = LocalData::builder_shared(Arc::clone(&tab_a)).build();
    let data_b = LocalData::builder_shared(Arc::clone(&tab_b)).build();

    let todos_in_b = LiveQuery::activate(data_b.todos.clone(), &*tab_b);
    let goals_in_b = LiveQuery::activate(data_b.monthly_goals.clone(), &*tab_b);
    println!("tab B sees {} todos", todos_in_b.snapshot().len());

    let milk = data_a.todos.create(TodoDraft::new("Buy milk"))?;
    println!("tab A created {:?}", milk.text);
    println!("tab B sees {} todos", todos_in_b.snapshot().len());

    data_a
        .todos
        .update(&milk.id, &serde_json::json!({ "completed": true }))?;
    println!(
        "tab B sees completed = {}",
        todos_in_b.snapshot()[0].completed
    );

    let mut goals = GoalSheet::default();
    goals.add_goal(GoalCategory::Weight, "Reach 65kg");
    goals.add_goal(GoalCategory::Achievement, "Pass the exam");
    data_a.monthly_goals.create(MonthlyGoalDraft {
        month: "2024-01".into(),
        goals,
        created_at: None,
    })?;

    for goal in goals_in_b.snapshot() {
        for category in GoalCategory::ALL {
            let (done, total) = goal.goals.progress(category);
            if total > 0 {
                println!("{} {}: {done}/{total}", goal.month, category.name());
            }
        }
    }

    let dark = data_a.settings.modify(|s| s.dark_mode = true)?;
    println!("tab A set dark mode = {}", dark.dark_mode);
    println!("tab B reads dark mode = {}", data_b.settings.get().dark_mode);
    Ok(())
}
