use std::sync::Arc;
use vision_studio_client::{
    app::{Action, App, Outcome},
    config::Config,
    gateway::{MockGateway, CHAT_PATH, IMAGE_PATH},
    models::{ImageRecord, Role},
    reply::ReplyFormat,
    Error,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        backend_url: server.uri(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_chat_session_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(serde_json::json!({
            "messages": [{ "role": "system" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello! How can I help?"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4-turbo",
            "messages": [
                { "role": "assistant", "content": "Hello! How can I help?" },
                { "role": "user", "content": "What is 2+2?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("4"))
        .expect(1)
        .mount(&server)
        .await;

    let app = App::new(&config_for(&server)).unwrap();

    app.dispatch(Action::Bootstrap).await.unwrap();
    let outcome = app
        .dispatch(Action::SendMessage("What is 2+2?".to_string()))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Reply(ref m) if m.content() == "4"));

    let transcript = app.chat().transcript();
    let pairs: Vec<(Role, &str)> = transcript
        .iter()
        .map(|m| (m.role(), m.content()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Role::Assistant, "Hello! How can I help?"),
            (Role::User, "What is 2+2?"),
            (Role::Assistant, "4"),
        ]
    );
}

#[tokio::test]
async fn test_image_generation_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(serde_json::json!({
            "model": "dall-e-3",
            "prompt": "a red fox",
            "size": "1024x1024",
            "quality": "standard",
            "n": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://img/x.png"))
        .expect(1)
        .mount(&server)
        .await;

    let app = App::new(&config_for(&server)).unwrap();

    let outcome = app
        .dispatch(Action::GenerateImage("a red fox".to_string()))
        .await
        .unwrap();

    let expected = ImageRecord::from("https://img/x.png");
    assert_eq!(outcome, Outcome::Image(expected.clone()));
    let state = app.images().snapshot();
    assert_eq!(state.current(), Some(&expected));
    assert_eq!(state.history().to_vec(), vec![expected]);
}

#[tokio::test]
async fn test_backend_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let app = App::new(&config_for(&server)).unwrap();

    let err = app
        .dispatch(Action::GenerateImage("a dream".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Backend { status: 500, .. }));
    assert!(app.images().snapshot().history().is_empty());
}

#[tokio::test]
async fn test_json_reply_format_unwraps_openai_style_payloads() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Hi from the envelope" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "url": "https://img/env.png" }]
        })))
        .mount(&server)
        .await;

    let config = Config {
        reply_format: ReplyFormat::Json,
        ..config_for(&server)
    };
    let app = App::new(&config).unwrap();

    let reply = app.chat().initialize().await.unwrap();
    assert_eq!(reply.content(), "Hi from the envelope");

    let record = app.images().generate("anything").await.unwrap();
    assert_eq!(record.as_str(), "https://img/env.png");
}

#[tokio::test]
async fn test_history_workflow_with_mock_gateway() {
    let gateway = MockGateway::new()
        .with_text("https://img/a.png")
        .with_text("https://img/b.png")
        .with_text("https://img/c.png");
    let app = App::with_gateway(Arc::new(gateway.clone()), &Config::default()).unwrap();

    for prompt in ["a", "b", "c"] {
        app.dispatch(Action::GenerateImage(prompt.to_string()))
            .await
            .unwrap();
    }

    let history: Vec<String> = app
        .images()
        .snapshot()
        .history()
        .iter()
        .map(|r| r.as_str().to_string())
        .collect();
    assert_eq!(
        history,
        vec!["https://img/c.png", "https://img/b.png", "https://img/a.png"]
    );

    let outcome = app.dispatch(Action::ShowImage(2)).await.unwrap();
    assert_eq!(outcome, Outcome::Shown(Some(ImageRecord::from("https://img/a.png"))));

    app.dispatch(Action::ClearHistory).await.unwrap();
    let state = app.images().snapshot();
    assert!(state.history().is_empty());
    assert_eq!(state.current(), Some(&ImageRecord::from("https://img/a.png")));
    assert_eq!(gateway.get_call_count(), 3);
}

#[tokio::test]
async fn test_retry_after_transport_failure_succeeds() {
    let gateway = MockGateway::new()
        .with_text("Hello")
        .with_transport_failure("connection reset")
        .with_text("Second try worked");
    let app = App::with_gateway(Arc::new(gateway), &Config::default()).unwrap();

    app.dispatch(Action::Bootstrap).await.unwrap();

    let message = "Are you there?".to_string();
    assert!(app
        .dispatch(Action::SendMessage(message.clone()))
        .await
        .unwrap_err()
        .is_transport());
    assert_eq!(app.chat().transcript().len(), 1);

    app.dispatch(Action::SendMessage(message)).await.unwrap();
    assert_eq!(app.chat().transcript().len(), 3);
}
