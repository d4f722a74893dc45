use std::io::Write as _;
use std::path::Path;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inkpress::core::config::PostStatus;
use inkpress::core::pipeline::{MediaUploader, Publisher};
use inkpress::core::types::{BlogDraft, MediaReference};
use inkpress::core::wordpress::WordPressClient;

// "user:pass" in base64, the application-password header WordPress expects.
const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";

fn client(server: &MockServer) -> WordPressClient {
    WordPressClient::new(&server.uri(), "user", "pass", PostStatus::Publish).unwrap()
}

fn draft() -> BlogDraft {
    BlogDraft {
        title: "Employer of Record (EOR) - Quick Guide".to_string(),
        html: "<h2 id=\"intro\">Employer of Record (EOR)</h2><p>body</p>".to_string(),
        meta_description: "Employer of Record (EOR) explained.".to_string(),
        keywords: "Employer of Record (EOR), eor services".to_string(),
        primary_keyword: "Employer of Record (EOR)".to_string(),
    }
}

fn temp_image() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("cover")
        .suffix(".png")
        .tempfile()
        .unwrap();
    file.write_all(b"not really a png, but small enough to pass through")
        .unwrap();
    file
}

#[tokio::test]
async fn uploads_media_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media"))
        .and(header("Authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "source_url": "https://example.com/wp-content/uploads/cover.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = temp_image();
    let media = client(&server).upload(image.path()).await.unwrap();

    assert_eq!(media.id, 42);
    assert_eq!(
        media.source_url.as_deref(),
        Some("https://example.com/wp-content/uploads/cover.png")
    );
}

#[tokio::test]
async fn rejected_uploads_surface_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let image = temp_image();
    let err = client(&server).upload(image.path()).await.unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("401"), "got: {msg}");
    assert!(msg.contains("invalid credentials"), "got: {msg}");
}

#[tokio::test]
async fn missing_image_files_never_reach_the_network() {
    let server = MockServer::start().await;

    let err = client(&server)
        .upload(Path::new("/no/such/cover.png"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("media upload error"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn publishes_with_featured_media_and_rank_math_meta() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_partial_json(json!({
            "title": "Employer of Record (EOR) - Quick Guide",
            "status": "publish",
            "featured_media": 42,
            "meta": {
                "rank_math_focus_keyword": "Employer of Record (EOR)",
                "rank_math_title": "Employer of Record (EOR) - Quick Guide"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1001,
            "status": "publish",
            "link": "https://example.com/?p=1001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let media = MediaReference {
        id: 42,
        source_url: None,
    };
    let result = client(&server).publish(&draft(), Some(&media)).await.unwrap();

    assert_eq!(result.post_id, 1001);
    assert_eq!(result.status, "publish");
    assert_eq!(result.link.as_deref(), Some("https://example.com/?p=1001"));
}

#[tokio::test]
async fn bare_posts_omit_the_featured_media_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1002})))
        .mount(&server)
        .await;

    let result = client(&server).publish(&draft(), None).await.unwrap();
    assert_eq!(result.post_id, 1002);
    // Status missing from the response falls back to what we asked for.
    assert_eq!(result.status, "publish");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("featured_media").is_none());
    assert_eq!(
        body["meta"]["rank_math_description"],
        "Employer of Record (EOR) explained."
    );
}

#[tokio::test]
async fn alt_text_failures_do_not_block_the_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1003})))
        .mount(&server)
        .await;

    let media = MediaReference {
        id: 42,
        source_url: None,
    };
    let result = client(&server).publish(&draft(), Some(&media)).await.unwrap();

    assert_eq!(result.post_id, 1003);
}

#[tokio::test]
async fn alt_text_carries_the_meta_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media/42"))
        .and(body_partial_json(json!({
            "alt_text": "Employer of Record (EOR) explained."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1004})))
        .mount(&server)
        .await;

    let media = MediaReference {
        id: 42,
        source_url: None,
    };
    client(&server).publish(&draft(), Some(&media)).await.unwrap();
}

#[tokio::test]
async fn rejected_posts_surface_the_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(400).set_body_string("rest_invalid_param"))
        .mount(&server)
        .await;

    let err = client(&server).publish(&draft(), None).await.unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("400"), "got: {msg}");
    assert!(msg.contains("rest_invalid_param"), "got: {msg}");
}
