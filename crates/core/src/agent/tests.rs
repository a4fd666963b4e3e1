use std::future::ready;
use std::sync::{Arc, Mutex};

use hcs_agent_model::{ErrorKind, ModelMessage, ToolCallRequest};
use hcs_agent_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::checkpoint::{Checkpointer, MemoryCheckpointer};
use crate::tool::{Error as ToolError, Tool, ToolResult};
use crate::{AgentBuilder, Error};

static MEMO_SCHEMA: Value = Value::Null;

#[derive(Deserialize)]
struct MemoInput {
    memo: String,
}

/// Pretends to create a topic and reports a fixed id.
struct FakeCreateTopic;

impl Tool for FakeCreateTopic {
    type Input = MemoInput;

    fn name(&self) -> &str {
        "CMD_HCS_CREATE_TOPIC"
    }

    fn description(&self) -> &str {
        "create a new HCS Topic"
    }

    fn parameter_schema(&self) -> &Value {
        &MEMO_SCHEMA
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(if input.memo == "forbidden" {
            Err(ToolError::execution_error().with_reason("INVALID_SIGNATURE"))
        } else {
            Ok(json!({ "txId": "0.0.2@1.2", "topicId": "0.0.9" }).to_string())
        })
    }
}

fn create_topic_call(id: &str, memo: &str) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: "CMD_HCS_CREATE_TOPIC".to_owned(),
        arguments: json!({ "memo": memo }),
    })
}

fn text(s: &str) -> PresetEvent {
    PresetEvent::MessageDelta(s.to_owned())
}

fn tool_contents(messages: &[ModelMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|msg| match msg {
            ModelMessage::Tool(result) => Some(result.content.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_simple_message() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("Hi, "),
        text("what can I do for you?"),
    ]));

    let deltas = Arc::new(Mutex::new(String::new()));
    let agent = AgentBuilder::with_model_provider(model_provider)
        .on_transcript({
            let deltas = Arc::clone(&deltas);
            move |delta| deltas.lock().unwrap().push_str(delta)
        })
        .build();

    let reply = agent.invoke("Hello", "0x0001").await.unwrap();
    assert_eq!(reply.text, "Hi, what can I do for you?");
    assert_eq!(reply.model_calls, 1);
    assert_eq!(*deltas.lock().unwrap(), "Hi, what can I do for you?");
}

#[tokio::test]
async fn test_tool_round_trip() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("Creating two topics."),
        create_topic_call("call:1", "first"),
        create_topic_call("call:2", "forbidden"),
    ]));
    model_provider.add_tool_result_step();
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("Created 0.0.9, the second one failed."),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(FakeCreateTopic)
        .build();
    let reply = agent.invoke("Make two topics", "0x0001").await.unwrap();
    assert_eq!(reply.text, "Created 0.0.9, the second one failed.");
    assert_eq!(reply.model_calls, 2);

    let requests = model_provider.received_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "CMD_HCS_CREATE_TOPIC");

    let last = &requests[1].messages;
    assert_eq!(last.len(), 4);
    match (&last[2], &last[3]) {
        (ModelMessage::Tool(first), ModelMessage::Tool(second)) => {
            assert_eq!(first.id, "call:1");
            assert_eq!(second.id, "call:2");
        }
        other => panic!("unexpected messages: {other:?}"),
    }
    let contents = tool_contents(last);
    let created: Value = serde_json::from_str(contents[0]).unwrap();
    assert_eq!(created, json!({ "txId": "0.0.2@1.2", "topicId": "0.0.9" }));
    assert_eq!(
        contents[1],
        "Error: INVALID_SIGNATURE\n Please fix your mistakes."
    );
}

#[tokio::test]
async fn test_unknown_tool() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        PresetEvent::ToolCall(ToolCallRequest {
            id: "call:1".to_owned(),
            name: "CMD_HCS_DELETE_TOPIC".to_owned(),
            arguments: json!({}),
        }),
    ]));
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("I cannot delete topics."),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(FakeCreateTopic)
        .build();
    let reply = agent.invoke("Delete 0.0.9", "0x0001").await.unwrap();
    assert_eq!(reply.text, "I cannot delete topics.");

    let requests = model_provider.received_requests();
    assert_eq!(
        tool_contents(&requests[1].messages),
        [
            "Error: CMD_HCS_DELETE_TOPIC is not a valid tool, try one of [CMD_HCS_CREATE_TOPIC]."
        ]
    );
}

#[tokio::test]
async fn test_recursion_limit() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    for i in 0..3 {
        model_provider.add_assistant_response_step(
            PresetResponse::with_events([create_topic_call(
                &format!("call:{i}"),
                "again",
            )]),
        );
        model_provider.add_tool_result_step();
    }

    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(FakeCreateTopic)
        .with_recursion_limit(2)
        .with_checkpointer(Arc::clone(&checkpointer))
        .build();

    let err = agent.invoke("Loop forever", "0x0001").await.unwrap_err();
    assert!(matches!(err, Error::RecursionLimit(2)));
    assert_eq!(model_provider.received_requests().len(), 2);
    assert!(checkpointer.load("0x0001").await.unwrap().is_none());
}

#[tokio::test]
async fn test_model_error_is_not_saved() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::failing(
        "upstream unavailable",
    ));

    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_checkpointer(Arc::clone(&checkpointer))
        .build();

    match agent.invoke("Hello", "0x0001").await {
        Err(Error::Model { kind, message }) => {
            assert_eq!(kind, ErrorKind::Other);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(checkpointer.load("0x0001").await.unwrap().is_none());
}

#[tokio::test]
async fn test_threads_keep_their_own_history() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("first"),
    ]));
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("second"),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_system_prompt("You are a Hedera assistant.")
        .build();

    assert_eq!(agent.invoke("a", "0x0001").await.unwrap().text, "first");
    assert_eq!(agent.invoke("b", "0x0001").await.unwrap().text, "second");
    assert_eq!(agent.invoke("c", "0x0002").await.unwrap().text, "first");

    let requests = model_provider.received_requests();
    let second_turn = &requests[1].messages;
    assert_eq!(
        second_turn[0],
        ModelMessage::System("You are a Hedera assistant.".to_owned())
    );
    assert_eq!(second_turn[1], ModelMessage::User("a".to_owned()));
    assert_eq!(second_turn[3], ModelMessage::User("b".to_owned()));
    let system_prompts = second_turn
        .iter()
        .filter(|msg| matches!(msg, ModelMessage::System(_)))
        .count();
    assert_eq!(system_prompts, 1);

    assert_eq!(
        requests[2].messages,
        [
            ModelMessage::System("You are a Hedera assistant.".to_owned()),
            ModelMessage::User("c".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_thread_locks_are_released() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        text("first"),
    ]));
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::failing(
        "upstream unavailable",
    ));

    let agent = AgentBuilder::with_model_provider(model_provider).build();

    assert_eq!(agent.invoke("a", "0x0001").await.unwrap().text, "first");
    assert!(agent.invoke("b", "0x0001").await.is_err());
    assert_eq!(agent.invoke("c", "0x0002").await.unwrap().text, "first");
    assert!(agent.thread_locks().is_empty());

    let (first, second) =
        tokio::join!(agent.invoke("d", "0x0003"), agent.invoke("e", "0x0004"));
    assert_eq!(first.unwrap().text, "first");
    assert_eq!(second.unwrap().text, "first");
    assert!(agent.thread_locks().is_empty());
}
