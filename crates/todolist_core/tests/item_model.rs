use chrono::NaiveDate;
use todolist_core::{
    is_storable_date, ItemKind, ItemValidationError, RecurrencePeriod, TodoItem, MAX_LABEL_CHARS,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn constructors_set_kind_specific_fields() {
    let task = TodoItem::task("  water plants  ");
    assert!(!task.id.is_nil());
    assert_eq!(task.kind, ItemKind::Task);
    assert_eq!(task.label, "water plants");
    assert_eq!(task.due_on, None);
    assert!(!task.is_completed());
    task.validate().unwrap();

    let deadline = TodoItem::task_with_deadline("file taxes", date(2024, 4, 15));
    assert_eq!(deadline.due_on, Some(date(2024, 4, 15)));
    deadline.validate().unwrap();

    let recurring =
        TodoItem::recurring("clean kitchen", RecurrencePeriod::days(7), date(2024, 1, 1));
    assert_eq!(recurring.kind, ItemKind::Recurring);
    assert_eq!(recurring.recurrence, Some(RecurrencePeriod::days(7)));
    assert_eq!(recurring.due_on, Some(date(2024, 1, 1)));
    recurring.validate().unwrap();

    let shopping = TodoItem::shopping_item("eggs", 12);
    assert_eq!(shopping.kind, ItemKind::ShoppingItem);
    assert_eq!(shopping.amount, Some(12));
    shopping.validate().unwrap();
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = TodoItem::with_id(Uuid::nil(), ItemKind::Task, "x").unwrap_err();
    assert_eq!(err, ItemValidationError::NilId);
}

#[test]
fn validate_rejects_blank_and_oversized_labels() {
    assert_eq!(
        TodoItem::task("   ").validate().unwrap_err(),
        ItemValidationError::EmptyLabel
    );

    let long_label = "é".repeat(MAX_LABEL_CHARS + 1);
    assert_eq!(
        TodoItem::task(long_label).validate().unwrap_err(),
        ItemValidationError::LabelTooLong {
            chars: MAX_LABEL_CHARS + 1,
            max: MAX_LABEL_CHARS,
        }
    );

    // Limit counts characters, not bytes.
    TodoItem::task("é".repeat(MAX_LABEL_CHARS)).validate().unwrap();
}

#[test]
fn validate_enforces_per_kind_shape() {
    let mut task = TodoItem::task("task");
    task.amount = Some(2);
    assert_eq!(
        task.validate().unwrap_err(),
        ItemValidationError::UnexpectedField {
            kind: ItemKind::Task,
            field: "amount",
        }
    );

    let zero = TodoItem::recurring("chore", RecurrencePeriod::default(), date(2024, 1, 1));
    assert_eq!(
        zero.validate().unwrap_err(),
        ItemValidationError::ZeroRecurrence
    );

    let mut closed = TodoItem::recurring("chore", RecurrencePeriod::days(1), date(2024, 1, 1));
    closed.completed_on = Some(date(2024, 1, 2));
    assert!(matches!(
        closed.validate().unwrap_err(),
        ItemValidationError::UnexpectedField {
            field: "completed_on",
            ..
        }
    ));

    let mut undated = TodoItem::recurring("chore", RecurrencePeriod::days(1), date(2024, 1, 1));
    undated.due_on = None;
    assert!(matches!(
        undated.validate().unwrap_err(),
        ItemValidationError::MissingField { field: "due_on", .. }
    ));

    assert_eq!(
        TodoItem::shopping_item("milk", 0).validate().unwrap_err(),
        ItemValidationError::ZeroAmount
    );

    let mut dated_shopping = TodoItem::shopping_item("milk", 1);
    dated_shopping.due_on = Some(date(2024, 1, 1));
    assert!(matches!(
        dated_shopping.validate().unwrap_err(),
        ItemValidationError::UnexpectedField { field: "due_on", .. }
    ));
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut item = TodoItem::with_id(id, ItemKind::Recurring, "take out trash").unwrap();
    item.recurrence = Some(RecurrencePeriod::weeks(1).unwrap());
    item.due_on = Some(date(2024, 3, 4));

    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["kind"], "recurring");
    assert_eq!(json["label"], "take out trash");
    assert_eq!(json["recurrence"], "P7D");
    assert_eq!(json["due_on"], "2024-03-04");
    assert_eq!(json["amount"], serde_json::Value::Null);

    let decoded: TodoItem = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, item);
}

#[test]
fn deserialize_rejects_invalid_shape() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "kind": "shopping_item",
        "label": "bread",
        "amount": 0
    });

    let err = serde_json::from_value::<TodoItem>(value).unwrap_err();
    assert!(
        err.to_string().contains("amount must be at least 1"),
        "unexpected error: {err}"
    );
}

#[test]
fn deserialize_trims_label_like_constructors() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "kind": "task",
        "label": "  call the plumber \n"
    });

    let item: TodoItem = serde_json::from_value(value).unwrap();
    assert_eq!(item.label, "call the plumber");
    assert_eq!(item, {
        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        TodoItem::with_id(id, ItemKind::Task, "call the plumber").unwrap()
    });
}

#[test]
fn validate_rejects_dates_outside_storable_years() {
    let mut task = TodoItem::task("archive");
    task.completed_on = Some(date(10000, 1, 1));
    assert!(matches!(
        task.validate().unwrap_err(),
        ItemValidationError::DateOutOfRange {
            field: "completed_on",
            ..
        }
    ));

    assert!(is_storable_date(date(0, 1, 1)));
    assert!(is_storable_date(date(9999, 12, 31)));
    assert!(!is_storable_date(date(-1, 12, 31)));
}
