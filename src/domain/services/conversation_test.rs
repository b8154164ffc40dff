use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use test_utils::long_question_fixture;
use tokio::sync::mpsc;

use super::Conversation;
use crate::domain::models::Action;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatType;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Responder;
use crate::domain::models::ResponderEvent;
use crate::domain::models::ResponderEventKind;
use crate::domain::models::Role;
use crate::domain::services::SessionStore;
use crate::infrastructure::responders::simulator::Pacing;
use crate::infrastructure::responders::simulator::ResponseSimulator;
use crate::infrastructure::storage::memory::MemoryStore;

struct Harness {
    memory: Arc<MemoryStore>,
    store: SessionStore,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
}

fn harness() -> Harness {
    let memory = Arc::new(MemoryStore::default());
    let store = SessionStore::new(memory.clone());
    let (tx, rx) = mpsc::unbounded_channel::<Action>();

    return Harness {
        memory,
        store,
        tx,
        rx,
    };
}

fn next_request(rx: &mut mpsc::UnboundedReceiver<Action>) -> ChatRequest {
    match rx.try_recv().unwrap() {
        Action::ResponderRequest(request) => return request,
    }
}

fn event(request: &ChatRequest, kind: ResponderEventKind) -> ResponderEvent {
    return ResponderEvent::new(request, kind);
}

fn assert_welcome_only(conversation: &Conversation) {
    let messages = conversation.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, 1);
    assert_eq!(messages[0].role, Role::Assistant);
    assert_eq!(messages[0].content, conversation.chat_type().welcome_text());
}

async fn simulate(request: ChatRequest) -> Vec<ResponderEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let simulator = ResponseSimulator::new(Duration::ZERO, Pacing::Fixed, true);
    simulator.respond(request, &tx).await.unwrap();

    let mut events = vec![];
    while let Ok(Event::Responder(event)) = rx.try_recv() {
        events.push(event);
    }

    return events;
}

async fn saved_session(store: &SessionStore, question: &str) -> String {
    let session_id = "session_1_saved".to_string();
    let messages = vec![
        ChatType::Unified.welcome_message(),
        Message::new(2, Role::User, question),
        Message::new(3, Role::Assistant, "Saved answer."),
    ];
    store
        .save_session(&session_id, &messages, ChatType::Unified)
        .await;

    return session_id;
}

#[tokio::test]
async fn it_starts_with_the_welcome_message() {
    let h = harness();
    let conversation = Conversation::new(ChatType::Syllabus, h.store, false);

    assert_welcome_only(&conversation);
    assert_eq!(conversation.current_session_id(), None);
    assert!(!conversation.is_busy());
}

#[tokio::test]
async fn it_submits_questions() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), true);

    assert!(conversation.submit("When is the midterm?", &h.tx).await?);

    let session_id = conversation.current_session_id().unwrap().to_string();
    assert!(session_id.starts_with("session_"));
    assert!(conversation.is_processing());
    assert!(!conversation.is_streaming());

    let last = conversation.messages().last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "When is the midterm?");

    let request = next_request(&mut h.rx);
    assert_eq!(request.session_id, session_id);
    assert_eq!(request.chat_type, ChatType::Unified);
    assert_eq!(request.question, "When is the midterm?");
    assert!(request.backend_available);

    let sessions = h.store.list_sessions(ChatType::Unified).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].title, "When is the midterm?");
    assert_eq!(conversation.sessions(), sessions.as_slice());

    return Ok(());
}

#[tokio::test]
async fn it_ignores_blank_questions() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, false);

    assert!(!conversation.submit("   \n", &h.tx).await?);
    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.current_session_id(), None);
    assert!(h.rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_accepts_one_question_at_a_time() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, false);

    assert!(conversation.submit("First question", &h.tx).await?);
    assert!(!conversation.submit("Second question", &h.tx).await?);

    let user_messages = conversation
        .messages()
        .iter()
        .filter(|message| {
            return message.is_user();
        })
        .count();
    assert_eq!(user_messages, 1);

    next_request(&mut h.rx);
    assert!(h.rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_reconciles_simulated_answers() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Syllabus, h.store.clone(), false);

    conversation
        .submit("When is the midterm exam?", &h.tx)
        .await?;
    let request = next_request(&mut h.rx);
    let events = simulate(request).await;
    let expected = match &events.last().unwrap().kind {
        ResponderEventKind::Complete(text) => text.to_string(),
        _ => panic!("Expected a completed answer"),
    };

    let mut saw_stage = false;
    for event in events {
        if let ResponderEventKind::Stage(stage) = &event.kind {
            conversation.handle_responder_event(event.clone()).await;
            assert_eq!(conversation.processing_stage(), stage);
            assert!(conversation.is_processing());
            saw_stage = true;
            continue;
        }

        conversation.handle_responder_event(event).await;
    }
    assert!(saw_stage);

    assert!(!conversation.is_busy());
    assert_eq!(conversation.streamed_text(), "");
    assert_eq!(conversation.processing_stage(), "");

    let messages = conversation.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, expected);

    let session_id = conversation.current_session_id().unwrap();
    assert_eq!(
        h.store.load_session(session_id, ChatType::Syllabus).await,
        messages
    );

    return Ok(());
}

#[tokio::test]
async fn it_shows_streamed_text_in_the_placeholder() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, true);

    conversation.submit("Hi", &h.tx).await?;
    let request = next_request(&mut h.rx);

    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Chunk {
                chunk: "Hel".to_string(),
                accumulated: "Hel".to_string(),
            },
        ))
        .await;

    assert!(conversation.is_streaming());
    assert!(!conversation.is_processing());

    let placeholder = conversation.messages().last().unwrap();
    assert_eq!(placeholder.role, Role::Assistant);
    assert_eq!(placeholder.content, "");
    assert_eq!(conversation.rendered_content(placeholder), "Hel");

    let question = &conversation.messages()[1];
    assert_eq!(conversation.rendered_content(question), "Hi");

    return Ok(());
}

#[tokio::test]
async fn it_finalizes_errors_as_assistant_messages() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, true);

    conversation.submit("Hi", &h.tx).await?;
    let request = next_request(&mut h.rx);

    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Error("Failed to get response".to_string()),
        ))
        .await;

    assert!(!conversation.is_busy());
    let last = conversation.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(
        last.content,
        "Sorry, I encountered an error: Failed to get response. Please try again."
    );

    // The composer is usable again.
    assert!(conversation.submit("Again", &h.tx).await?);

    return Ok(());
}

#[tokio::test]
async fn it_drops_answers_for_sessions_that_are_no_longer_active() -> Result<()> {
    let mut h = harness();
    let saved_id = saved_session(&h.store, "What's the grading breakdown?").await;
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), true);

    conversation.submit("When is the final?", &h.tx).await?;
    let request = next_request(&mut h.rx);
    let asked_in = request.session_id.to_string();
    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Chunk {
                chunk: "The".to_string(),
                accumulated: "The".to_string(),
            },
        ))
        .await;

    conversation.load_chat_session(&saved_id).await;
    let loaded = conversation.messages().to_vec();
    assert!(!conversation.is_busy());

    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Complete("The final is on May 5.".to_string()),
        ))
        .await;

    assert_eq!(conversation.messages(), loaded.as_slice());
    assert_eq!(conversation.current_session_id(), Some(saved_id.as_str()));
    assert!(!conversation.is_busy());

    let transcript = h.store.load_session(&asked_in, ChatType::Unified).await;
    assert!(transcript.iter().all(|message| {
        return message.content != "The final is on May 5.";
    }));

    return Ok(());
}

#[tokio::test]
async fn it_drops_answers_after_starting_a_new_chat() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, false);

    conversation.submit("Hi", &h.tx).await?;
    let request = next_request(&mut h.rx);

    conversation.start_new_chat();
    assert_ne!(
        conversation.current_session_id(),
        Some(request.session_id.as_str())
    );

    conversation
        .handle_responder_event(event(&request, ResponderEventKind::Started))
        .await;
    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Complete("Late".to_string()),
        ))
        .await;

    assert_welcome_only(&conversation);
    assert!(!conversation.is_busy());

    return Ok(());
}

#[tokio::test]
async fn it_drops_earlier_answers_after_switching_back_to_the_session() -> Result<()> {
    let mut h = harness();
    let saved_id = saved_session(&h.store, "What's the grading breakdown?").await;
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), true);
    conversation.load_chat_session(&saved_id).await;

    conversation.submit("When is the final?", &h.tx).await?;
    let first = next_request(&mut h.rx);
    conversation
        .handle_responder_event(event(
            &first,
            ResponderEventKind::Chunk {
                chunk: "The".to_string(),
                accumulated: "The".to_string(),
            },
        ))
        .await;

    conversation.start_new_chat();
    conversation.load_chat_session(&saved_id).await;
    assert!(conversation.submit("Where are office hours?", &h.tx).await?);
    let second = next_request(&mut h.rx);
    assert_eq!(second.session_id, first.session_id);
    assert_ne!(second.request_id, first.request_id);

    conversation
        .handle_responder_event(event(
            &first,
            ResponderEventKind::Complete("The final is on May 5.".to_string()),
        ))
        .await;

    assert!(conversation.is_processing());
    let last = conversation.messages().last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "Where are office hours?");

    conversation
        .handle_responder_event(event(
            &second,
            ResponderEventKind::Complete("Tuesday & Thursday 2:00-4:00 PM".to_string()),
        ))
        .await;

    assert!(!conversation.is_busy());
    let last = conversation.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "Tuesday & Thursday 2:00-4:00 PM");

    let transcript = h.store.load_session(&saved_id, ChatType::Unified).await;
    assert_eq!(transcript, conversation.messages());
    assert!(transcript.iter().all(|message| {
        return message.content != "The final is on May 5.";
    }));

    return Ok(());
}

#[tokio::test]
async fn it_drops_late_answers_after_reloading_the_same_session() -> Result<()> {
    let mut h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), true);

    conversation.submit("When is the final?", &h.tx).await?;
    let request = next_request(&mut h.rx);
    conversation
        .handle_responder_event(event(&request, ResponderEventKind::Started))
        .await;
    assert!(conversation.is_streaming());

    conversation.load_chat_session(&request.session_id).await;
    assert!(!conversation.is_busy());
    let reloaded = conversation.messages().to_vec();

    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Chunk {
                chunk: "The".to_string(),
                accumulated: "The".to_string(),
            },
        ))
        .await;
    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Complete("The final is on May 5.".to_string()),
        ))
        .await;

    assert_eq!(conversation.messages(), reloaded.as_slice());
    assert!(!conversation.is_busy());
    assert_eq!(conversation.streamed_text(), "");

    let transcript = h
        .store
        .load_session(&request.session_id, ChatType::Unified)
        .await;
    assert_eq!(transcript, reloaded);

    return Ok(());
}

#[tokio::test]
async fn it_never_saves_welcome_only_sessions() {
    let h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), false);

    conversation.start_new_chat();
    conversation.start_new_chat();

    assert!(h.store.list_sessions(ChatType::Unified).await.is_empty());
    assert!(conversation.sessions().is_empty());
}

#[tokio::test]
async fn it_restores_the_most_recent_session() {
    let h = harness();
    let saved_id = saved_session(&h.store, "What's the grading breakdown?").await;

    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), false);
    conversation.restore().await;

    assert_eq!(conversation.current_session_id(), Some(saved_id.as_str()));
    assert_eq!(conversation.messages().len(), 3);
    assert_eq!(conversation.sessions().len(), 1);

    let mut syllabus = Conversation::new(ChatType::Syllabus, h.store, false);
    syllabus.restore().await;
    assert_eq!(syllabus.current_session_id(), None);
    assert_welcome_only(&syllabus);
}

#[tokio::test]
async fn it_opens_sessions_without_transcripts_as_empty() {
    let h = harness();
    let mut conversation = Conversation::new(ChatType::Unified, h.store, false);

    conversation.load_chat_session("session_1_missing").await;

    assert_eq!(
        conversation.current_session_id(),
        Some("session_1_missing")
    );
    assert_welcome_only(&conversation);
}

#[tokio::test]
async fn it_starts_over_when_deleting_the_active_session() -> Result<()> {
    let mut h = harness();
    let other_id = saved_session(&h.store, "Who is the instructor?").await;
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), false);

    conversation.submit(long_question_fixture(), &h.tx).await?;
    let request = next_request(&mut h.rx);
    let active_id = request.session_id.to_string();
    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Complete("Sure.".to_string()),
        ))
        .await;
    assert_eq!(conversation.sessions().len(), 2);

    assert!(conversation.delete_chat_session(&active_id).await);

    assert_ne!(conversation.current_session_id(), Some(active_id.as_str()));
    assert_welcome_only(&conversation);
    assert_eq!(conversation.sessions().len(), 1);
    assert_eq!(conversation.sessions()[0].id, other_id);
    assert!(h
        .store
        .load_session(&active_id, ChatType::Unified)
        .await
        .is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_conversation_when_deleting_another_session() -> Result<()> {
    let mut h = harness();
    let other_id = saved_session(&h.store, "Who is the instructor?").await;
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), false);

    conversation.submit("Hi", &h.tx).await?;
    let active_id = next_request(&mut h.rx).session_id;

    assert!(conversation.delete_chat_session(&other_id).await);
    assert_eq!(conversation.current_session_id(), Some(active_id.as_str()));
    assert_eq!(conversation.messages().len(), 2);
    assert!(conversation.is_processing());

    return Ok(());
}

#[tokio::test]
async fn it_keeps_chat_types_apart() -> Result<()> {
    let mut h = harness();
    let mut unified = Conversation::new(ChatType::Unified, h.store.clone(), false);
    let mut syllabus = Conversation::new(ChatType::Syllabus, h.store.clone(), false);

    unified.submit("Pivot tables?", &h.tx).await?;
    let unified_request = next_request(&mut h.rx);
    syllabus.submit("Office hours?", &h.tx).await?;
    let syllabus_request = next_request(&mut h.rx);

    // An answer for one chat type never lands in the other.
    syllabus
        .handle_responder_event(event(
            &unified_request,
            ResponderEventKind::Complete("Pivot answer".to_string()),
        ))
        .await;
    assert!(syllabus.is_processing());

    syllabus
        .handle_responder_event(event(
            &syllabus_request,
            ResponderEventKind::Complete("Office answer".to_string()),
        ))
        .await;

    let unified_sessions = h.store.list_sessions(ChatType::Unified).await;
    let syllabus_sessions = h.store.list_sessions(ChatType::Syllabus).await;
    assert_eq!(unified_sessions.len(), 1);
    assert_eq!(syllabus_sessions.len(), 1);
    assert_eq!(unified_sessions[0].title, "Pivot tables?");
    assert_eq!(syllabus_sessions[0].title, "Office hours?");

    return Ok(());
}

#[tokio::test]
async fn it_keeps_working_when_storage_fails() -> Result<()> {
    let mut h = harness();
    h.memory.set_unavailable(true);
    let mut conversation = Conversation::new(ChatType::Unified, h.store.clone(), false);
    conversation.restore().await;

    assert!(conversation.submit("Hi", &h.tx).await?);
    let request = next_request(&mut h.rx);
    let session_id = request.session_id.to_string();
    conversation
        .handle_responder_event(event(
            &request,
            ResponderEventKind::Complete("Hello!".to_string()),
        ))
        .await;

    assert_eq!(conversation.messages().len(), 3);
    assert_eq!(conversation.messages()[2].content, "Hello!");
    assert!(conversation.sessions().is_empty());
    assert!(!conversation.delete_chat_session(&session_id).await);

    h.memory.set_unavailable(false);
    assert!(h.store.list_sessions(ChatType::Unified).await.is_empty());

    return Ok(());
}
