//! API integration tests for the image endpoints.
//!
//! Tests verify:
//! - Upload, show, list/search and delete round trips
//! - Validation failures (422) and their error bodies
//! - Not-found handling for show and delete
//! - Newest-first ordering

use axum::body::Body;
use axum::http::{Request, StatusCode};

use image_vault::images::MAX_IMAGE_BYTES;

use super::test_utils::{
    create_test_jpeg, create_test_png, delete, get, padded_jpeg, post_multipart, MultipartBuilder,
    TestApp, AUTH_HEADER, TEST_SECRET,
};

fn titles(json: &serde_json::Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_and_show() {
    let app = TestApp::new();

    let created = app.create("Sunset").await;
    assert_eq!(created["title"], "Sunset");
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["created_at"], created["updated_at"]);

    let file_path = created["file_path"].as_str().unwrap();
    assert!(file_path.starts_with("images/"));
    assert!(file_path.ends_with(".jpg"));
    assert!(app.blobs.contains(file_path).await);

    let (status, shown) = app
        .send(get(&format!("/products/{}", created["id"])))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown, created);
}

#[tokio::test]
async fn test_create_stores_uploaded_bytes() {
    let app = TestApp::new();
    let png = create_test_png(4, 4);

    let body = MultipartBuilder::new()
        .text("title", "Tiny")
        .file("image", "tiny.png", "image/png", &png)
        .build();
    let (status, created) = app.send(post_multipart("/products", body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let file_path = created["file_path"].as_str().unwrap();
    assert!(file_path.ends_with(".png"));
    assert_eq!(app.blobs.get(file_path).await.unwrap().as_ref(), &png[..]);
}

#[tokio::test]
async fn test_create_stores_detected_content_type() {
    let app = TestApp::new();

    // Client-declared type is ignored in favour of the detected one
    let body = MultipartBuilder::new()
        .text("title", "Typed")
        .file("image", "photo.bin", "application/octet-stream", &create_test_jpeg(8, 8))
        .build();
    let (status, created) = app.send(post_multipart("/products", body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let file_path = created["file_path"].as_str().unwrap();
    assert_eq!(
        app.blobs.content_type(file_path).await.as_deref(),
        Some("image/jpeg")
    );
}

#[tokio::test]
async fn test_create_extension_follows_content_not_file_name() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "Mislabelled")
        .file("image", "photo.gif", "image/gif", &create_test_png(4, 4))
        .build();
    let (status, created) = app.send(post_multipart("/products", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["file_path"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn test_create_trims_title() {
    let app = TestApp::new();
    let created = app.create("  Harbour  ").await;
    assert_eq!(created["title"], "Harbour");
}

#[tokio::test]
async fn test_create_ignores_unknown_fields() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("description", "not a field")
        .text("title", "Lake")
        .file("image", "a.jpg", "image/jpeg", &create_test_jpeg(8, 8))
        .build();
    let (status, created) = app.send(post_multipart("/products", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Lake");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_create_empty_title_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "")
        .file("image", "a.jpg", "image/jpeg", &create_test_jpeg(8, 8))
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["message"], "The title field is required.");
    assert_eq!(json["errors"]["title"][0], "The title field is required.");
    assert!(json["errors"].get("image").is_none());

    assert_eq!(app.record_count().await, 0);
    assert_eq!(app.blobs.count().await, 0);
}

#[tokio::test]
async fn test_create_non_utf8_title_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text_bytes("title", &[0xFF, 0xFE, 0x41])
        .file("image", "a.jpg", "image/jpeg", &create_test_jpeg(8, 8))
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["errors"]["title"][0], "The title field must be a string.");
    assert!(json["errors"].get("image").is_none());

    assert_eq!(app.record_count().await, 0);
    assert_eq!(app.blobs.count().await, 0);
}

#[tokio::test]
async fn test_create_title_too_long_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", &"a".repeat(256))
        .file("image", "a.jpg", "image/jpeg", &create_test_jpeg(8, 8))
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["errors"]["title"][0],
        "The title field must not be greater than 255 characters."
    );
}

#[tokio::test]
async fn test_create_title_at_limit_accepted() {
    let app = TestApp::new();
    // 255 multi-byte characters count as 255, not as their byte length
    let title = "é".repeat(255);
    let created = app.create(&title).await;
    assert_eq!(created["title"].as_str().unwrap().chars().count(), 255);
}

#[tokio::test]
async fn test_create_non_image_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "Notes")
        .file("image", "notes.jpg", "image/jpeg", b"just some text, not pixels")
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["errors"]["image"][0], "The image field must be an image.");
    assert_eq!(app.blobs.count().await, 0);
}

#[tokio::test]
async fn test_create_image_as_text_field_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "Text")
        .text("image", "not a file")
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["errors"]["image"][0], "The image field must be an image.");
}

#[tokio::test]
async fn test_create_oversized_image_rejected() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "Huge")
        .file("image", "huge.jpg", "image/jpeg", &padded_jpeg(MAX_IMAGE_BYTES + 1))
        .build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["errors"]["image"][0],
        "The image field must not be greater than 2048 kilobytes."
    );
    assert_eq!(app.record_count().await, 0);
}

#[tokio::test]
async fn test_create_image_at_size_limit_accepted() {
    let app = TestApp::new();

    let body = MultipartBuilder::new()
        .text("title", "Exactly")
        .file("image", "max.jpg", "image/jpeg", &padded_jpeg(MAX_IMAGE_BYTES))
        .build();
    let (status, _) = app.send(post_multipart("/products", body)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_missing_fields_lists_both() {
    let app = TestApp::new();

    let body = MultipartBuilder::new().build();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["message"],
        "The title field is required. (and 1 more error)"
    );
    assert_eq!(json["errors"]["title"][0], "The title field is required.");
    assert_eq!(json["errors"]["image"][0], "The image field is required.");
}

#[tokio::test]
async fn test_create_non_multipart_validated_as_empty_form() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/products")
        .header(AUTH_HEADER, TEST_SECRET)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title": "Sunset"}"#))
        .unwrap();
    let (status, json) = app.send(request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["errors"].get("title").is_some());
    assert!(json["errors"].get("image").is_some());
}

#[tokio::test]
async fn test_create_malformed_multipart_rejected() {
    let app = TestApp::new();

    // Opening boundary with no terminating boundary
    let body = b"--image-vault-test-boundary\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nunterminated".to_vec();
    let (status, json) = app.send(post_multipart("/products", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());
    assert_eq!(app.record_count().await, 0);
}

// =============================================================================
// Show
// =============================================================================

#[tokio::test]
async fn test_show_missing_returns_404() {
    let app = TestApp::new();

    let (status, json) = app.send(get("/products/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No image found with id 999999.");
}

#[tokio::test]
async fn test_show_non_numeric_id_returns_404() {
    let app = TestApp::new();

    let (status, _) = app.send(get("/products/sunset")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// List and Search
// =============================================================================

#[tokio::test]
async fn test_list_empty() {
    let app = TestApp::new();

    let (status, json) = app.send(get("/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_newest_first() {
    let app = TestApp::new();
    app.create("A").await;
    app.create("B").await;
    app.create("C").await;

    let (status, json) = app.send(get("/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&json), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn test_search_filters_by_title_substring() {
    let app = TestApp::new();
    app.create("Sunset").await;
    app.create("Moonlight").await;

    let (status, json) = app.send(get("/products?search=Sun")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&json), vec!["Sunset"]);

    // Substring anywhere in the title
    let (_, json) = app.send(get("/products?search=light")).await;
    assert_eq!(titles(&json), vec!["Moonlight"]);
}

#[tokio::test]
async fn test_search_is_case_sensitive() {
    let app = TestApp::new();
    app.create("Sunset").await;

    let (_, json) = app.send(get("/products?search=sun")).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_search_empty_matches_all() {
    let app = TestApp::new();
    app.create("Sunset").await;
    app.create("Moonlight").await;

    let (_, json) = app.send(get("/products?search=")).await;
    assert_eq!(titles(&json), vec!["Moonlight", "Sunset"]);
}

#[tokio::test]
async fn test_search_no_match_returns_empty_array() {
    let app = TestApp::new();
    app.create("Sunset").await;

    let (status, json) = app.send(get("/products?search=Mountain")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_search_percent_encoded() {
    let app = TestApp::new();
    app.create("Red Sunset").await;
    app.create("Sunrise").await;

    let (_, json) = app.send(get("/products?search=Red%20Sun")).await;
    assert_eq!(titles(&json), vec!["Red Sunset"]);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_removes_record_and_blob() {
    let app = TestApp::new();
    let created = app.create("Sunset").await;
    let id = created["id"].as_i64().unwrap();
    let file_path = created["file_path"].as_str().unwrap();

    let (status, json) = app.send(delete(&format!("/products/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"message": "Image deleted successfully."}));

    let (status, _) = app.send(get(&format!("/products/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!app.blobs.contains(file_path).await);
    assert_eq!(app.record_count().await, 0);
}

#[tokio::test]
async fn test_delete_missing_returns_404() {
    let app = TestApp::new();

    let (status, json) = app.send(delete("/products/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No image found with id 999999.");
}

#[tokio::test]
async fn test_delete_twice_second_is_404() {
    let app = TestApp::new();
    let created = app.create("Once").await;
    let uri = format!("/products/{}", created["id"]);

    let (status, _) = app.send(delete(&uri)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(delete(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_leaves_other_records() {
    let app = TestApp::new();
    let keep = app.create("Keep").await;
    let drop = app.create("Drop").await;

    let (status, _) = app
        .send(delete(&format!("/products/{}", drop["id"])))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = app.send(get("/products")).await;
    assert_eq!(titles(&json), vec!["Keep"]);
    assert!(app.blobs.contains(keep["file_path"].as_str().unwrap()).await);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let app = TestApp::new();
    let first = app.create("First").await;
    app.send(delete(&format!("/products/{}", first["id"]))).await;

    let second = app.create("Second").await;
    assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_unsupported_method_returns_405() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("PUT")
        .uri("/products/1")
        .header(AUTH_HEADER, TEST_SECRET)
        .body(Body::empty())
        .unwrap();
    let response_status = app.send(request).await.0;
    assert_eq!(response_status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}
