use pagemark::llm::remote::RemoteLlmProvider;
use pagemark::llm::{LlmProvider, LlmRequest};

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    // Mock successful OpenAI-compatible response
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r##"{
                "model": "gemma2-9b-it",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "# Rewritten\n\nThis is a test response"
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            }"##,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemma2-9b-it");

    let request = LlmRequest {
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: Some(0.7),
        timeout_seconds: Some(10),
    };

    let result = provider.generate(request).await;

    assert!(result.is_ok());
    let response = result.unwrap();
    assert_eq!(response.content, "# Rewritten\n\nThis is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gemma2-9b-it");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    // Mock API error
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r##"{"error": {"message": "Rate limit exceeded"}}"##)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemma2-9b-it");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_empty_choices() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r##"{"model": "gemma2-9b-it", "choices": []}"##)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemma2-9b-it");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("no choices"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rewrite_pass_through_remote_provider() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r##"{
                "model": "gemma2-9b-it",
                "choices": [{
                    "message": {"role": "assistant", "content": "# Clean Markdown"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 50, "completion_tokens": 10, "total_tokens": 60}
            }"##,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemma2-9b-it");

    let rewritten = pagemark::llm::rewrite::rewrite_markdown(&provider, "raw scraped markdown")
        .await
        .expect("rewrite succeeds");
    assert_eq!(rewritten, "# Clean Markdown");

    mock.assert_async().await;
}
