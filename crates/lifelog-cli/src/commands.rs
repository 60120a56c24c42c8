use lifelog::{TodoDraft, COLLECTION_KEYS, SETTINGS_KEY};
use lifelog_store::{BackingStore, LocalData, MigrationReport};
use serde::Serialize;
use serde_json::{json, Map, Value};

pub type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// What `status` prints about the opened backend.
pub struct BackendInfo {
    pub backend: &'static str,
    pub path: String,
    pub size: u64,
    pub journal: Option<String>,
}

/// `lifelog status`: backend, file and per-slot statistics.
pub fn status<S: BackingStore>(data: &LocalData<S>, info: &BackendInfo) -> Result {
    match &info.journal {
        Some(mode) => println!("Database: {} ({}, {mode} mode)", info.path, info.backend),
        None => println!("Database: {} ({})", info.path, info.backend),
    }
    println!("Size: {}", format_bytes(info.size));
    println!();

    let summaries = data.slot_summaries();
    if summaries.iter().all(|s| !s.present) {
        println!("  (empty database)");
        return Ok(());
    }

    println!(
        "  {:<20} {:>10} {:>10} {:>10}",
        "Slot", "Present", "Records", "Size"
    );
    println!("  {}", "-".repeat(54));

    let (mut total_records, mut total_bytes) = (0u64, 0u64);
    for slot in &summaries {
        let records = match slot.records {
            Some(n) => {
                total_records += n as u64;
                format_num(n as u64)
            }
            None => "-".to_string(),
        };
        total_bytes += slot.bytes as u64;
        println!(
            "  {:<20} {:>10} {:>10} {:>10}",
            slot.key,
            if slot.present { "yes" } else { "no" },
            records,
            format_bytes(slot.bytes as u64),
        );
    }

    println!("  {}", "-".repeat(54));
    println!(
        "  {:<20} {:>10} {:>10} {:>10}",
        "Total",
        "",
        format_num(total_records),
        format_bytes(total_bytes),
    );
    println!();

    Ok(())
}

/// `lifelog list <collection>`: the typed collection as pretty JSON.
pub fn list<S: BackingStore>(data: &LocalData<S>, collection: &str) -> Result {
    let value = collection_json(data, collection)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn collection_json<S: BackingStore>(
    data: &LocalData<S>,
    collection: &str,
) -> std::result::Result<Value, Box<dyn std::error::Error>> {
    fn to_json<T: Serialize>(
        records: T,
    ) -> std::result::Result<Value, Box<dyn std::error::Error>> {
        Ok(serde_json::to_value(records)?)
    }

    match collection {
        "todos" => to_json(data.todos.get_all()),
        "schedules" => to_json(data.schedules.get_all()),
        "sleepRecords" => to_json(data.sleep_records.get_all()),
        "weightRecords" => to_json(data.weight_records.get_all()),
        "mealRecords" => to_json(data.meal_records.get_all()),
        "diaryEntries" => to_json(data.diary_entries.get_all()),
        "dailyRoutines" => to_json(data.daily_routines.get_all()),
        "monthlyGoals" => to_json(data.monthly_goals.get_all()),
        "weeklyGoals" => to_json(data.weekly_goals.get_all()),
        "links" => to_json(data.links.get_all()),
        "settings" | SETTINGS_KEY => to_json(data.settings.get()),
        other => Err(format!(
            "unknown collection '{other}' (expected one of: {}, settings)",
            COLLECTION_KEYS.join(", ")
        )
        .into()),
    }
}

/// `lifelog todo add <text>`.
pub fn todo_add<S: BackingStore>(data: &LocalData<S>, text: &str) -> Result {
    let todo = data.todos.create(TodoDraft::new(text))?;
    println!("Created todo {}", todo.id);
    Ok(())
}

/// `lifelog todo done <id>`.
pub fn todo_done<S: BackingStore>(data: &LocalData<S>, id: &str) -> Result {
    match data.todos.update(id, &json!({ "completed": true }))? {
        Some(todo) => {
            println!("Completed: {}", todo.text);
            Ok(())
        }
        None => Err(format!("todo '{id}' not found").into()),
    }
}

/// `lifelog todo rm <id>`.
pub fn todo_rm<S: BackingStore>(data: &LocalData<S>, id: &str) -> Result {
    if data.todos.delete(id)? {
        println!("Removed todo {id}");
        Ok(())
    } else {
        Err(format!("todo '{id}' not found").into())
    }
}

/// `lifelog migrate`: migrate both goal collections and report.
pub fn migrate<S: BackingStore>(data: &LocalData<S>) -> Result {
    let (monthly, weekly) = data.migrate_all()?;

    if !monthly.changed() && !weekly.changed() {
        println!("All goal records are current. Nothing to migrate.");
        return Ok(());
    }

    print_report(data.monthly_goals.key(), &monthly);
    print_report(data.weekly_goals.key(), &weekly);
    Ok(())
}

fn print_report(key: &str, report: &MigrationReport) {
    println!(
        "{key}: {} of {} records migrated",
        format_num(report.migrated as u64),
        format_num(report.examined as u64)
    );
    for (step, changed) in &report.per_step {
        if *changed > 0 {
            println!("  {step:<28} {:>8}", format_num(*changed as u64));
        }
    }
}

/// `lifelog settings`.
pub fn settings_show<S: BackingStore>(data: &LocalData<S>) -> Result {
    let stored = data.store().get(SETTINGS_KEY)?.is_some();
    let settings = data.settings.get();
    println!("  {:<20} {}", "darkMode", settings.dark_mode);
    println!("  {:<20} {}", "themeColor", settings.theme_color);
    println!("  {:<20} {}", "pushNotifications", settings.push_notifications);
    if !stored {
        println!();
        println!("  (defaults, nothing stored yet)");
    }
    Ok(())
}

/// `lifelog settings set`.
pub fn settings_set<S: BackingStore>(
    data: &LocalData<S>,
    dark_mode: Option<bool>,
    theme_color: Option<String>,
    push: Option<bool>,
) -> Result {
    let patch = settings_patch(dark_mode, theme_color, push);
    if patch.is_empty() {
        return Err("nothing to set (use --dark-mode, --theme-color or --push)".into());
    }
    data.settings.update(&patch)?;
    settings_show(data)
}

fn settings_patch(
    dark_mode: Option<bool>,
    theme_color: Option<String>,
    push: Option<bool>,
) -> Map<String, Value> {
    let mut patch = Map::new();
    if let Some(v) = dark_mode {
        patch.insert("darkMode".into(), Value::Bool(v));
    }
    if let Some(v) = theme_color {
        patch.insert("themeColor".into(), Value::String(v));
    }
    if let Some(v) = push {
        patch.insert("pushNotifications".into(), Value::Bool(v));
    }
    patch
}

// ── Helpers ──────────────────────────────────────────────────────────

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog_store::MemoryStore;

    fn data() -> LocalData<MemoryStore> {
        LocalData::open(MemoryStore::new())
    }

    #[test]
    fn bytes_and_numbers() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_num(7), "7");
        assert_eq!(format_num(1000), "1,000");
        assert_eq!(format_num(1234567), "1,234,567");
    }

    #[test]
    fn todo_lifecycle() {
        let data = data();
        todo_add(&data, "Buy milk").unwrap();
        let id = data.todos.get_all()[0].id.clone();

        todo_done(&data, &id).unwrap();
        assert!(data.todos.get_by_id(&id).unwrap().completed);

        todo_rm(&data, &id).unwrap();
        assert!(data.todos.get_all().is_empty());
        assert!(todo_rm(&data, &id).is_err());
        assert!(todo_done(&data, &id).is_err());
    }

    #[test]
    fn list_known_and_unknown() {
        let data = data();
        todo_add(&data, "a").unwrap();
        let todos = collection_json(&data, "todos").unwrap();
        assert_eq!(todos[0]["text"], "a");

        let settings = collection_json(&data, "settings").unwrap();
        assert_eq!(settings["themeColor"], "pink");

        let err = collection_json(&data, "notes").unwrap_err();
        assert!(err.to_string().contains("unknown collection 'notes'"));
    }

    #[test]
    fn list_goals_migrates() {
        let data = data();
        data.store()
            .set(
                "weeklyGoals",
                &json!([{
                    "id": "w1",
                    "week": "2024-01-01",
                    "todoGoal": "Read",
                    "createdAt": "2024-01-01T00:00:00.000Z"
                }])
                .to_string(),
            )
            .unwrap();
        let goals = collection_json(&data, "weeklyGoals").unwrap();
        assert_eq!(goals[0]["todoGoals"], json!(["Read"]));
    }

    #[test]
    fn settings_patch_only_names_given_fields() {
        let patch = settings_patch(Some(true), None, Some(false));
        assert_eq!(
            Value::Object(patch),
            json!({ "darkMode": true, "pushNotifications": false })
        );
        assert!(settings_patch(None, None, None).is_empty());
    }

    #[test]
    fn settings_set_persists() {
        let data = data();
        assert!(settings_set(&data, None, None, None).is_err());
        assert_eq!(data.store().get(SETTINGS_KEY).unwrap(), None);

        settings_set(&data, None, Some("navy".into()), None).unwrap();
        let s = data.settings.get();
        assert_eq!(s.theme_color, "navy");
        assert!(!s.dark_mode);
    }

    #[test]
    fn migrate_and_status_run() {
        let data = data();
        let info = BackendInfo {
            backend: "memory",
            path: ":memory:".into(),
            size: 0,
            journal: None,
        };
        status(&data, &info).unwrap();
        migrate(&data).unwrap();
        todo_add(&data, "x").unwrap();
        status(&data, &info).unwrap();
    }
}
