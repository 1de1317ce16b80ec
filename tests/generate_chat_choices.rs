#![cfg(feature = "provider-chat-choices")]

use httpmock::{Method::POST, MockServer};
use serde_json::json;

use pictor::{GenerateRequest, ProviderUpdate, Result, Studio};

const ENDPOINT: &str = "/api/v1/services/aigc/multimodal-generation/generation";

async fn studio_against(
    server: &MockServer,
    api_key: Option<&str>,
) -> Result<(tempfile::TempDir, Studio)> {
    let dir = tempfile::tempdir()?;
    let studio = Studio::open(dir.path()).await?;
    let update = ProviderUpdate {
        api_key: api_key.map(str::to_string),
        base_url: Some(server.base_url()),
        ..ProviderUpdate::default()
    };
    studio.config().update_provider("dashscope", &update).await?;
    Ok((dir, studio))
}

#[tokio::test]
async fn missing_credential_never_reaches_the_network() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(ENDPOINT);
            then.status(200).json_body(json!({}));
        })
        .await;

    let (_dir, studio) = studio_against(&server, None).await?;
    let response = studio.generate(&GenerateRequest::new("cat", "dashscope")).await?;

    assert!(!response.success);
    assert_eq!(response.error.expect("error").code, "MISSING_API_KEY");
    assert_eq!(mock.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn generates_with_defaults_from_the_catalog() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(ENDPOINT)
                .header("authorization", "Bearer sk-test-key")
                .json_body(json!({
                    "model": "qwen-image-plus",
                    "input": {
                        "messages": [
                            { "role": "user", "content": [{ "text": "cat" }] }
                        ]
                    },
                    "parameters": { "size": "1328*1328", "n": 1, "watermark": false }
                }));
            then.status(200).json_body(json!({
                "output": {
                    "choices": [{
                        "message": {
                            "content": [{ "image": "https://cdn.example.com/cat.png" }]
                        }
                    }]
                },
                "usage": { "width": 1328, "height": 1328 },
                "request_id": "req-1"
            }));
        })
        .await;

    let (_dir, studio) = studio_against(&server, Some("sk-test-key")).await?;
    let response = studio.generate(&GenerateRequest::new("cat", "dashscope")).await?;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.images.len(), 1);
    assert_eq!(response.images[0].url, "https://cdn.example.com/cat.png");
    assert_eq!(response.images[0].width, Some(1328));
    assert_eq!(response.images[0].height, Some(1328));
    Ok(())
}

#[tokio::test]
async fn request_overrides_win_over_defaults() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(ENDPOINT).json_body_includes(
                json!({ "model": "qwen-image", "parameters": { "size": "1664*928" } }).to_string(),
            );
            then.status(200).json_body(json!({
                "output": {
                    "choices": [{
                        "message": { "content": [{ "image": "https://cdn.example.com/b.png" }] }
                    }]
                }
            }));
        })
        .await;

    let (_dir, studio) = studio_against(&server, Some("sk-test-key")).await?;
    let request = GenerateRequest::new("cat", "dashscope")
        .with_model("qwen-image")
        .with_size("1664*928");
    let response = studio.generate(&request).await?;

    mock.assert_async().await;
    assert!(response.success);
    Ok(())
}

#[tokio::test]
async fn provider_error_envelope_surfaces_native_code() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ENDPOINT);
            then.status(401).json_body(json!({
                "request_id": "req-9",
                "code": "InvalidApiKey",
                "message": "Invalid API-key provided."
            }));
        })
        .await;

    let (_dir, studio) = studio_against(&server, Some("sk-bad-key")).await?;
    let response = studio.generate(&GenerateRequest::new("cat", "dashscope")).await?;

    assert!(!response.success);
    let error = response.error.expect("error");
    assert_eq!(error.code, "InvalidApiKey");
    assert_eq!(error.provider, "dashscope");
    assert_eq!(error.request_id.as_deref(), Some("req-9"));
    Ok(())
}

#[tokio::test]
async fn empty_choice_list_is_no_images() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ENDPOINT);
            then.status(200)
                .json_body(json!({ "output": { "choices": [] } }));
        })
        .await;

    let (_dir, studio) = studio_against(&server, Some("sk-test-key")).await?;
    let response = studio.generate(&GenerateRequest::new("cat", "dashscope")).await?;

    assert!(!response.success);
    assert_eq!(response.error.expect("error").code, "NO_IMAGES_GENERATED");
    Ok(())
}

#[tokio::test]
async fn non_json_failure_becomes_http_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ENDPOINT);
            then.status(502).body("<html>bad gateway</html>");
        })
        .await;

    let (_dir, studio) = studio_against(&server, Some("sk-test-key")).await?;
    let response = studio.generate(&GenerateRequest::new("cat", "dashscope")).await?;

    assert!(!response.success);
    let error = response.error.expect("error");
    assert_eq!(error.code, "HTTP_ERROR");
    assert!(error.message.contains("502"));
    Ok(())
}
