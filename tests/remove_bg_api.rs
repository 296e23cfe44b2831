//! Integration tests for the remove.bg client against a local mock server.

use bg_remover_bot::config::Settings;
use bg_remover_bot::removal::RemoveBgClient;

fn test_settings(endpoint: String) -> Settings {
    Settings {
        telegram_token: "dummy".to_string(),
        remove_bg_api_key: "test-key".to_string(),
        remove_bg_endpoint: endpoint,
    }
}

#[tokio::test]
async fn success_returns_exact_body_bytes() {
    let mut server = mockito::Server::new_async().await;
    let processed: &[u8] = b"\x89PNG\r\n\x1a\nprocessed-image-bytes";

    let mock = server
        .mock("POST", "/removebg")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(processed)
        .create_async()
        .await;

    let client = RemoveBgClient::new(&test_settings(format!("{}/removebg", server.url())));
    let result = client.remove_background(b"raw input image".to_vec()).await;

    assert_eq!(result.as_deref(), Some(processed));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_returns_none() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/removebg")
        .with_status(500)
        .with_body(r#"{"errors":[{"title":"Internal error"}]}"#)
        .create_async()
        .await;

    let client = RemoveBgClient::new(&test_settings(format!("{}/removebg", server.url())));
    let result = client.remove_background(b"raw input image".to_vec()).await;

    assert!(result.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn payment_required_returns_none() {
    // remove.bg signals an exhausted quota with 402
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/removebg")
        .with_status(402)
        .with_body(r#"{"errors":[{"title":"Insufficient credits"}]}"#)
        .create_async()
        .await;

    let client = RemoveBgClient::new(&test_settings(format!("{}/removebg", server.url())));
    let result = client.remove_background(b"raw input image".to_vec()).await;

    assert!(result.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn oversized_multibyte_error_body_returns_none() {
    // Error-body truncation must back off to a char boundary: place a
    // three-byte '€' straddling byte offset 500 of the response body.
    let mut server = mockito::Server::new_async().await;
    let body = format!("{}€ and more error text", "a".repeat(499));

    let mock = server
        .mock("POST", "/removebg")
        .with_status(500)
        .with_body(&body)
        .create_async()
        .await;

    let client = RemoveBgClient::new(&test_settings(format!("{}/removebg", server.url())));
    let result = client.remove_background(b"raw input image".to_vec()).await;

    assert!(result.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn network_failure_returns_none() {
    // Port 1 is never bound; the connection is refused immediately
    let client = RemoveBgClient::new(&test_settings("http://127.0.0.1:1/removebg".to_string()));
    let result = client.remove_background(b"raw input image".to_vec()).await;

    assert!(result.is_none());
}
