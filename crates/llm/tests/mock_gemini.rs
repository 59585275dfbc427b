use llm::{Client, FinishReason, GenerateOptions, LlmError, SafetySetting};
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn client(server: &MockServer) -> Client {
    Client::new("test-key".into(), MODEL.into())
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn generate_sends_prompt_config_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "hello" }] }],
            "generationConfig": { "responseMimeType": "application/json" },
            "safetySettings": [
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_ONLY_HIGH" },
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_ONLY_HIGH" },
                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_ONLY_HIGH" },
                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_ONLY_HIGH" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"ok\":true}" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let opts = GenerateOptions {
        temperature: Some(0.2),
        json_output: true,
        safety: SafetySetting::relaxed(),
    };
    let out = client(&server).generate("hello", &opts).await.unwrap();
    assert_eq!(out.text.as_deref(), Some("{\"ok\":true}"));
    assert_eq!(out.finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn non_success_status_carries_upstream_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = client(&server).simple("x").await.unwrap_err();
    match err {
        LlmError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "API key not valid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "candidates": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let cli = client(&server).with_timeout(Duration::from_millis(200));
    let err = cli.simple("x").await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let err = client(&server).simple("x").await.unwrap_err();
    assert!(matches!(err, LlmError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn safety_stop_has_no_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let out = client(&server).simple("x").await.unwrap();
    assert_eq!(out.text, None);
    assert_eq!(out.finish_reason, Some(FinishReason::Safety));
    assert!(!out.finish_reason.unwrap().is_normal());
}

#[tokio::test]
async fn truncated_error_body_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Drain the whole request (the JSON body ends with '}') before answering.
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.ends_with(b"}") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let cli = Client::new("test-key".into(), MODEL.into())
        .unwrap()
        .with_base_url(format!("http://{addr}"));
    match cli.simple("x").await.unwrap_err() {
        LlmError::Status { status, body } => {
            assert_eq!(status, 502);
            assert!(body.starts_with("<unreadable body:"), "got {body:?}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
