use pretty_assertions::assert_eq;

use tasktrack_core::document::{decode_document, encode_document};
use tasktrack_core::task::{Priority, Status, Task};

fn task(id: u32, description: &str, status: Status, priority: Priority) -> Task {
    Task {
        id,
        description: description.to_string(),
        status,
        priority,
        created_at: "2024-01-01 10:00:00".to_string(),
        updated_at: "2024-01-02 12:30:00".to_string(),
    }
}

fn sample_list() -> Vec<Task> {
    vec![
        task(1, "Buy milk", Status::Todo, Priority::High),
        task(2, "buy milk, eggs", Status::InProgress, Priority::Medium),
        task(5, "Read: chapter 3 {draft}", Status::Done, Priority::Low),
    ]
}

#[test]
fn round_trip_preserves_ids_fields_and_order() {
    let tasks = sample_list();
    let decoded = decode_document(&encode_document(&tasks));
    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.tasks, tasks);
}

#[test]
fn escaped_characters_survive_round_trip() {
    let tasks = vec![task(
        1,
        "quote \" backslash \\ newline \n tab \t cr \r end",
        Status::Todo,
        Priority::Medium,
    )];
    let decoded = decode_document(&encode_document(&tasks));
    assert_eq!(decoded.tasks, tasks);
}

#[test]
fn boundary_text_inside_description_does_not_split() {
    let tasks = vec![
        task(1, "odd },{ text", Status::Todo, Priority::Medium),
        task(2, "second", Status::Todo, Priority::Medium),
    ];
    let decoded = decode_document(&encode_document(&tasks));
    assert_eq!(decoded.tasks, tasks);
}

#[test]
fn encode_document_matches_on_disk_layout() {
    let tasks = vec![
        task(1, "Buy milk", Status::Todo, Priority::High),
        task(2, "Walk dog", Status::Done, Priority::Low),
    ];
    let expected = "[\n  {\n    \"id\": 1,\n    \"description\": \"Buy milk\",\n    \"status\": \"todo\",\n    \"priority\": \"high\",\n    \"createdAt\": \"2024-01-01 10:00:00\",\n    \"updatedAt\": \"2024-01-02 12:30:00\"\n  },\n  {\n    \"id\": 2,\n    \"description\": \"Walk dog\",\n    \"status\": \"done\",\n    \"priority\": \"low\",\n    \"createdAt\": \"2024-01-01 10:00:00\",\n    \"updatedAt\": \"2024-01-02 12:30:00\"\n  }\n]";
    assert_eq!(encode_document(&tasks), expected);
}

#[test]
fn empty_documents_decode_to_empty_list() {
    for text in ["", "   \n", "[]", "[\n]", " [ ] "] {
        let decoded = decode_document(text);
        assert!(decoded.tasks.is_empty(), "input {:?}", text);
        assert!(decoded.warnings.is_empty(), "input {:?}", text);
    }
}

#[test]
fn single_record_document_decodes_one_task() {
    let text = "[\n  {\n    \"id\": 1,\n    \"description\": \"Buy milk\",\n    \"status\": \"todo\",\n    \"priority\": \"high\",\n    \"createdAt\": \"2024-01-01 10:00:00\",\n    \"updatedAt\": \"2024-01-01 10:00:00\"\n  }\n]";
    let decoded = decode_document(text);
    assert_eq!(decoded.tasks.len(), 1);
    let first = &decoded.tasks[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.status, Status::Todo);
    assert_eq!(first.priority, Priority::High);

    let reencoded = encode_document(&decoded.tasks);
    assert_eq!(reencoded, text);
}

#[test]
fn missing_priority_defaults_to_medium() {
    let text = r#"[{"id": 1, "description": "legacy", "status": "todo", "createdAt": "2023-05-01 08:00:00", "updatedAt": "2023-05-01 08:00:00"}]"#;
    let decoded = decode_document(text);
    assert_eq!(decoded.tasks.len(), 1);
    assert_eq!(decoded.tasks[0].priority, Priority::Medium);
}

#[test]
fn malformed_id_is_skipped_with_warning() {
    let text = r#"[
  {"id": 1, "description": "first", "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": "abc", "description": "broken", "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": 3, "description": "third", "status": "done", "createdAt": "t", "updatedAt": "t"}
]"#;
    let decoded = decode_document(text);
    let ids: Vec<u32> = decoded.tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(decoded.warnings.len(), 1);
    assert!(decoded.warnings[0].contains("Invalid id: abc"));
    assert!(decoded.warnings[0].contains("broken"));
}

#[test]
fn unterminated_string_only_loses_its_own_record() {
    let text = r#"[
  {"id": 1, "description": "broken, "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": 2, "description": "second", "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": 3, "description": "third", "status": "done", "createdAt": "t", "updatedAt": "t"}
]"#;
    let decoded = decode_document(text);
    let ids: Vec<u32> = decoded.tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(decoded.warnings.len(), 1);
    assert!(decoded.warnings[0].contains("broken"));
    assert!(!decoded.warnings[0].contains("second"));
}

#[test]
fn unterminated_string_mid_document_keeps_later_records() {
    let text = r#"[
  {"id": 1, "description": "first", "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": 2, "description": "half, "status": "todo", "createdAt": "t", "updatedAt": "t"},
  {"id": 3, "description": "third", "status": "done", "createdAt": "t", "updatedAt": "t"},
  {"id": 4, "description": "fourth", "status": "done", "createdAt": "t", "updatedAt": "t"}
]"#;
    let decoded = decode_document(text);
    let ids: Vec<u32> = decoded.tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1, 3, 4]);
    assert_eq!(decoded.warnings.len(), 1);
    assert!(decoded.warnings[0].contains("half"));
}

#[test]
fn missing_brackets_and_compact_layout_are_tolerated() {
    let text = r#"{"id":1,"description":"a","status":"todo","createdAt":"t","updatedAt":"t"},{"id":2,"description":"b","status":"done","createdAt":"t","updatedAt":"t"}"#;
    let decoded = decode_document(text);
    let ids: Vec<u32> = decoded.tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn serde_json_output_is_readable() {
    let mut tasks = sample_list();
    tasks[0].description = "tab\there, café \u{1} ctrl".to_string();
    let json = serde_json::to_string_pretty(&tasks).expect("serialize");
    let decoded = decode_document(&json);
    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.tasks, tasks);
}
