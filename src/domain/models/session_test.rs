use chrono::DateTime;
use test_utils::long_question_fixture;

use super::create_session_id;
use super::index_key;
use super::session_title;
use super::transcript_key;
use super::SessionIndexEntry;
use crate::domain::models::ChatType;
use crate::domain::models::Message;
use crate::domain::models::Role;

#[test]
fn it_titles_from_the_first_user_message() {
    let messages = vec![
        ChatType::Unified.welcome_message(),
        Message::new(2, Role::User, "When is the midterm exam?"),
        Message::new(3, Role::User, "And the final?"),
    ];

    assert_eq!(session_title(&messages), "When is the midterm exam?");
}

#[test]
fn it_truncates_long_titles() {
    let question = long_question_fixture();
    assert_eq!(question.chars().count(), 80);

    let messages = vec![
        ChatType::Unified.welcome_message(),
        Message::new(2, Role::User, question),
    ];

    let title = session_title(&messages);
    assert_eq!(title, format!("{}...", &question[..50]));
}

#[test]
fn it_keeps_titles_of_exactly_fifty_chars() {
    let question = "x".repeat(50);
    let messages = vec![Message::new(2, Role::User, &question)];

    assert_eq!(session_title(&messages), question);
}

#[test]
fn it_truncates_on_char_boundaries() {
    let question = "é".repeat(60);
    let messages = vec![Message::new(2, Role::User, &question)];

    let title = session_title(&messages);
    assert_eq!(title, format!("{}...", "é".repeat(50)));
}

#[test]
fn it_uses_a_placeholder_without_user_messages() {
    let messages = vec![ChatType::Syllabus.welcome_message()];
    assert_eq!(session_title(&messages), "New conversation");
}

#[test]
fn it_builds_index_entries() {
    let messages = vec![
        ChatType::Unified.welcome_message(),
        Message::new(2, Role::User, "What's the grading breakdown?"),
    ];

    let entry = SessionIndexEntry::from_messages("session_1_abc", &messages);
    assert_eq!(entry.id, "session_1_abc");
    assert_eq!(entry.title, "What's the grading breakdown?");
    assert_eq!(entry.message_count, 2);
    assert_eq!(entry.created_at, messages[0].timestamp);
    assert!(entry.updated_at >= entry.created_at);
}

#[test]
fn it_serializes_index_entries_in_camel_case() {
    let entry = SessionIndexEntry {
        id: "session_1_abc".to_string(),
        title: "Hi".to_string(),
        message_count: 2,
        created_at: "2026-01-01T00:00:00.000+00:00".to_string(),
        updated_at: "2026-01-02T00:00:00.000+00:00".to_string(),
    };

    insta::assert_snapshot!(serde_json::to_string(&entry).unwrap(), @r###"{"id":"session_1_abc","title":"Hi","messageCount":2,"createdAt":"2026-01-01T00:00:00.000+00:00","updatedAt":"2026-01-02T00:00:00.000+00:00"}"###);
}

#[test]
fn it_creates_unique_session_ids() {
    let first = create_session_id();
    let second = create_session_id();

    assert_ne!(first, second);
    let parts = first.split('_').collect::<Vec<&str>>();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "session");
    assert!(parts[1].parse::<i64>().is_ok());
    assert_eq!(parts[2].len(), 9);
}

#[test]
fn it_namespaces_storage_keys() {
    assert_eq!(index_key(ChatType::Unified), "sessions-index:unified");
    assert_eq!(
        transcript_key(ChatType::Syllabus, "session_1_abc"),
        "chat:syllabus:session_1_abc"
    );
}

fn entry_updated_at(updated_at: &str) -> SessionIndexEntry {
    return SessionIndexEntry {
        id: "session_1_abc".to_string(),
        title: "When is the midterm exam?".to_string(),
        message_count: 3,
        created_at: updated_at.to_string(),
        updated_at: updated_at.to_string(),
    };
}

#[test]
fn it_describes_how_long_ago_a_session_was_updated() {
    let now = DateTime::parse_from_rfc3339("2026-02-20T12:00:00.000-07:00").unwrap();

    let cases = [
        ("2026-02-20T11:59:30.000-07:00", "Just now"),
        ("2026-02-20T11:15:00.000-07:00", "45m ago"),
        ("2026-02-20T09:00:00.000-07:00", "3h ago"),
        ("2026-02-18T12:00:00.000-07:00", "2d ago"),
        ("2026-01-05T08:00:00.000-07:00", "Jan 5, 2026"),
        ("not a timestamp", ""),
    ];

    for (updated_at, expected) in cases {
        assert_eq!(entry_updated_at(updated_at).updated_ago(now), expected);
    }
}
