use daybook::export::{self, Export, ExportKind};
use daybook::{ClipboardItem, Collection, Database, DayOfWeek, Note, ScheduleEntry};
use tempfile::TempDir;

fn now() -> chrono::NaiveDateTime {
    daybook::utils::parse_timestamp("2024-05-01 08:30:00").unwrap()
}

#[test]
fn notes_export_keeps_tags_as_a_json_array() {
    let db = Database::open_in_memory().unwrap();
    let mut note = Note::new("Reading list".to_string(), "Spring".to_string());
    note.tags = vec!["books".to_string(), "2024".to_string()];
    db.create(&note).unwrap();

    let (json, total) = export::export_json(&db, ExportKind::Notes, now()).unwrap();
    assert_eq!(total, 1);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["collection"], "Notes");
    assert_eq!(value["exported_at"], "2024-05-01T08:30:00");
    assert_eq!(value["records"][0]["tags"], serde_json::json!(["books", "2024"]));

    let parsed: Export<Note> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.records[0].title, "Reading list");
}

#[test]
fn clipboard_export_lists_pinned_items_first() {
    let db = Database::open_in_memory().unwrap();
    let first = db.create(&ClipboardItem::new("first".to_string())).unwrap();
    db.create(&ClipboardItem::new("second".to_string())).unwrap();
    db.toggle_clipboard_pin(first).unwrap();

    let export = export::clipboard(&db, now()).unwrap();
    assert_eq!(export.collection, Collection::ClipboardItems);
    assert_eq!(export.total, 2);
    assert_eq!(export.records[0].content, "first");
    assert!(export.records[0].pinned);
}

#[test]
fn schedule_export_is_written_monday_first() {
    let db = Database::open_in_memory().unwrap();
    for (day, subject) in [(DayOfWeek::Friday, "Art"), (DayOfWeek::Monday, "Maths")] {
        let entry = ScheduleEntry::new(day, subject.to_string(), "8:00".to_string(), "9:30".to_string());
        db.create(&entry).unwrap();
    }

    let dir = TempDir::new().unwrap();
    let path = dir
        .path()
        .join("exports")
        .join(export::default_file_name(ExportKind::Schedule, now()));
    let (json, _) = export::export_json(&db, ExportKind::Schedule, now()).unwrap();
    export::write_file(&path, &json).unwrap();

    let written: Export<ScheduleEntry> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let subjects: Vec<&str> = written.records.iter().map(|e| e.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Maths", "Art"]);
    assert_eq!(written.records[0].start_time, "08:00");
}

#[test]
fn empty_collection_exports_zero_records() {
    let db = Database::open_in_memory().unwrap();
    let export = export::notes(&db, now()).unwrap();
    assert_eq!(export.total, 0);
    assert!(export.records.is_empty());
}
