//! Chatbot service tests with a scripted backend.
//!
//! Tests cover: successful replies, every fallback path, the placeholder
//! reply, rate limiting, and the request the backend receives.

use barber_core::chatbot::{
    ChatBackend, ChatReply, ChatRequest, ChatbotService, FallbackReason, ReplySource, Role,
    PLACEHOLDER_REPLY,
};
use barber_core::config::{ChatbotConfig, PLACEHOLDER_API_KEY};
use barber_core::content::{ContentCatalog, NarrativeScript};
use barber_core::customer::CustomerInstance;
use barber_core::dialogue::DialogueCategory;
use barber_core::error::ChatError;
use barber_core::rng::{RngBank, StreamRng, StreamSlot};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Replays canned results and records every request it receives.
struct ScriptedBackend {
    replies:  VecDeque<Result<String, ChatError>>,
    requests: Rc<RefCell<Vec<ChatRequest>>>,
}

impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&mut self, request: &ChatRequest) -> Result<String, ChatError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Transport("script exhausted".into())))
    }
}

fn configured() -> ChatbotConfig {
    ChatbotConfig {
        api_key: Some("sk-test".into()),
        ..ChatbotConfig::default()
    }
}

fn service(
    config: ChatbotConfig,
    replies: Vec<Result<String, ChatError>>,
) -> (ChatbotService, Rc<RefCell<Vec<ChatRequest>>>) {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let backend = ScriptedBackend {
        replies:  replies.into(),
        requests: Rc::clone(&requests),
    };
    let fallback = NarrativeScript::default().fallback_replies;
    (ChatbotService::new(config, Box::new(backend), fallback), requests)
}

fn rng() -> StreamRng {
    RngBank::new(0xC4A7).for_stream(StreamSlot::Chatbot)
}

fn is_fallback_line(reply: &ChatReply, category: DialogueCategory) -> bool {
    NarrativeScript::default()
        .fallback_replies
        .lines(category)
        .contains(&reply.text)
}

#[test]
fn configured_backend_answers_in_character() {
    let (mut chat, requests) = service(configured(), vec![Ok("Just a trim, friend.".into())]);
    let catalog = ContentCatalog::default_test();
    chat.start_conversation(&CustomerInstance::new(catalog.customers[0].clone()));

    let reply = chat.send("You from around here?", DialogueCategory::Probe, 0.0, &mut rng());
    assert_eq!(reply.source, ReplySource::Chatbot);
    assert_eq!(reply.text, "Just a trim, friend.");

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.model, "gpt-3.5-turbo");
    assert_eq!(sent.max_tokens, 150);
    assert_eq!(sent.messages.len(), 2);
    assert_eq!(sent.messages[0].role, Role::System);
    assert!(sent.messages[0].content.contains("Mike Thompson"));
    assert_eq!(sent.messages[1].role, Role::User);
    assert_eq!(sent.messages[1].content, "You from around here?");

    let roles: Vec<Role> = chat.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
}

#[test]
fn suspect_prompt_carries_the_secret_identity() {
    let (mut chat, requests) = service(configured(), vec![Ok("Hm.".into())]);
    let catalog = ContentCatalog::default_test();
    let mut suspect = CustomerInstance::new(catalog.customers[3].clone());
    suspect.bind_suspect(catalog.suspects[1].clone());
    chat.start_conversation(&suspect);
    chat.send("Nice watch.", DialogueCategory::SmallTalk, 0.0, &mut rng());

    let system = &requests.borrow()[0].messages[0].content;
    assert!(system.contains("Slick Eddie"));
    assert!(system.contains("Expensive watch"));
}

#[test]
fn backend_failure_falls_back_to_a_category_line() {
    let failure = ChatError::Status { status: 500, body: "upstream down".into() };
    let (mut chat, _) = service(configured(), vec![Err(failure.clone())]);

    let reply = chat.send("You seem on edge...", DialogueCategory::Direct, 0.0, &mut rng());
    assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Failed));
    assert!(!reply.text.is_empty());
    assert!(is_fallback_line(&reply, DialogueCategory::Direct));
    assert_eq!(chat.failures(), 1);
    assert_eq!(chat.last_error(), Some(&failure));
}

#[test]
fn failure_without_fallback_gives_the_placeholder() {
    let config = ChatbotConfig {
        use_fallback_on_error: false,
        ..configured()
    };
    let (mut chat, _) = service(config, vec![Err(ChatError::Timeout)]);

    let reply = chat.send("Family man?", DialogueCategory::Probe, 0.0, &mut rng());
    assert_eq!(reply.source, ReplySource::Placeholder);
    assert_eq!(reply.text, PLACEHOLDER_REPLY);
    assert_eq!(chat.history().last().map(|m| m.content.as_str()), Some(PLACEHOLDER_REPLY));
}

#[test]
fn malformed_reply_counts_as_failure() {
    let (mut chat, _) = service(configured(), vec![Err(ChatError::Malformed("empty reply".into()))]);
    let reply = chat.send("Come here often?", DialogueCategory::SmallTalk, 0.0, &mut rng());
    assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Failed));
    assert!(is_fallback_line(&reply, DialogueCategory::SmallTalk));
}

#[test]
fn requests_inside_the_interval_are_rate_limited() {
    let (mut chat, requests) = service(
        configured(),
        vec![Ok("First.".into()), Ok("Second.".into())],
    );
    let mut rng = rng();

    let first = chat.send("one", DialogueCategory::SmallTalk, 10.0, &mut rng);
    assert_eq!(first.source, ReplySource::Chatbot);

    let limited = chat.send("two", DialogueCategory::Probe, 10.5, &mut rng);
    assert_eq!(limited.source, ReplySource::Fallback(FallbackReason::RateLimited));
    assert!(is_fallback_line(&limited, DialogueCategory::Probe));
    assert_eq!(requests.borrow().len(), 1, "a rate-limited call never reaches the backend");
    assert_eq!(chat.failures(), 0);

    let later = chat.send("three", DialogueCategory::Probe, 11.1, &mut rng);
    assert_eq!(later.source, ReplySource::Chatbot);
    assert_eq!(later.text, "Second.");
    assert_eq!(requests.borrow().len(), 2);
}

#[test]
fn unconfigured_service_never_calls_the_backend() {
    for api_key in [None, Some(PLACEHOLDER_API_KEY.to_string()), Some("   ".to_string())] {
        let config = ChatbotConfig {
            api_key,
            ..ChatbotConfig::default()
        };
        let (mut chat, requests) = service(config, vec![Ok("should not be used".into())]);
        assert!(!chat.is_configured());

        let mut rng = rng();
        for category in DialogueCategory::ALL {
            let reply = chat.send("hello", category, 0.0, &mut rng);
            assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Unconfigured));
            assert!(is_fallback_line(&reply, category));
        }
        assert!(requests.borrow().is_empty());
        assert_eq!(chat.history().len(), 6, "every exchange is still recorded");
    }
}

#[test]
fn new_conversation_forgets_the_previous_customer() {
    let (mut chat, requests) = service(configured(), vec![Ok("a".into()), Ok("b".into())]);
    let catalog = ContentCatalog::default_test();

    chat.start_conversation(&CustomerInstance::new(catalog.customers[0].clone()));
    chat.send("hi", DialogueCategory::SmallTalk, 0.0, &mut rng());
    chat.start_conversation(&CustomerInstance::new(catalog.customers[1].clone()));
    chat.send("hi", DialogueCategory::SmallTalk, 5.0, &mut rng());

    let second = &requests.borrow()[1];
    assert_eq!(second.messages.len(), 2);
    assert!(second.messages[0].content.contains("Tony Deluca"));
    assert!(!second.messages[0].content.contains("Mike Thompson"));
}

#[test]
fn skipped_requests_answer_with_the_local_line() {
    let (mut chat, requests) = service(ChatbotConfig::default(), vec![]);
    let reply = chat.send_or_local("hi", DialogueCategory::Probe, 0.0, &mut rng(), "*touches scar*".into());
    assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Unconfigured));
    assert_eq!(reply.text, "*touches scar*");
    assert!(requests.borrow().is_empty());

    let (mut chat, _) = service(configured(), vec![Ok("First.".into())]);
    let mut rng = rng();
    chat.send_or_local("one", DialogueCategory::SmallTalk, 3.0, &mut rng, "unused".into());
    let limited = chat.send_or_local("two", DialogueCategory::Probe, 3.2, &mut rng, "Local.".into());
    assert_eq!(limited.source, ReplySource::Fallback(FallbackReason::RateLimited));
    assert_eq!(limited.text, "Local.");
    assert_eq!(chat.history().last().map(|m| m.content.as_str()), Some("Local."));
}

#[test]
fn offline_backend_with_a_key_uses_the_local_line() {
    let (mut chat, requests) = service(configured(), vec![Err(ChatError::Unconfigured)]);
    let reply = chat.send_or_local("hi", DialogueCategory::Direct, 0.0, &mut rng(), "Local.".into());
    assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Unconfigured));
    assert_eq!(reply.text, "Local.");
    assert_eq!(requests.borrow().len(), 1);
    assert_eq!(chat.failures(), 0, "an offline backend is not a failed request");
}

#[test]
fn failed_request_keeps_the_canned_fallback() {
    let (mut chat, _) = service(configured(), vec![Err(ChatError::Timeout)]);
    let reply = chat.send_or_local("hi", DialogueCategory::Probe, 0.0, &mut rng(), "Local.".into());
    assert_eq!(reply.source, ReplySource::Fallback(FallbackReason::Failed));
    assert!(is_fallback_line(&reply, DialogueCategory::Probe));
    assert_eq!(chat.failures(), 1);
}
