use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, path_regex},
};

/// Test that the mock server can serve provider-like conditions responses
#[tokio::test]
async fn test_mock_conditions_api() {
    let mock_server = MockServer::start().await;

    // Mock weather provider conditions response
    Mock::given(method("GET"))
        .and(path_regex(r"/[^/]+/conditions/q/[A-Z]{2}/.*\.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_observation": {
                "temp_f": 54.0,
                "icon": "cloudy"
            }
        })))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!(
            "{}/key123/conditions/q/MN/Minneapolis.json",
            mock_server.uri()
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["current_observation"]["temp_f"], 54.0);
    assert_eq!(body["current_observation"]["icon"], "cloudy");
}

/// Test that the mock server can stand in for the mail API
#[tokio::test]
async fn test_mock_mail_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .and(header("X-Server-Token", "token-abc"))
        .and(body_partial_json(json!({
            "To": "john_whatevs@email.com"
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/email", mock_server.uri()))
        .header("X-Server-Token", "token-abc")
        .json(&json!({
            "From": "weather@example.com",
            "To": "john_whatevs@email.com",
            "Subject": "Enjoy a discount on us.",
            "HtmlBody": "<html></html>"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

/// Test error handling with timeout simulation
#[tokio::test]
async fn test_timeout_handling() {
    let mock_server = MockServer::start().await;

    // Mock a slow provider that would exceed the request timeout
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(100))
        .build()
        .expect("Failed to build client");

    let result = client
        .get(format!("{}/slow", mock_server.uri()))
        .send()
        .await;

    // Should timeout
    assert!(result.is_err());
}

/// Test HTTP error responses
#[tokio::test]
async fn test_http_error_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/error", mock_server.uri()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 500);
}
