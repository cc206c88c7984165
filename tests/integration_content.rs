mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{TestApp, blob, body_bytes, body_json, stream_uri};
use coursemart::coursemart_core::UserRole;
use coursemart::coursemart_delivery::{CourseRef, Identity};
use coursemart::coursemart_models::{ContentBlock, ContentBlockId, OrderStatus};
use serde_json::json;

const BOUNDARY: &str = "coursemart-test-boundary";

fn block_uri(course: &CourseRef, block: &ContentBlock) -> String {
    format!("/api/courses/{}/contents/blocks/{}", course.id, block.id)
}

fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: &TestApp,
    who: &Identity,
    course: &CourseRef,
    block: &ContentBlock,
    field: &str,
    file_name: &str,
    data: &[u8],
) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(format!("{}/upload", block_uri(course, block)))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(who)))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, file_name, data)))
        .unwrap();
    app.send(request).await
}

async fn patch(
    app: &TestApp,
    who: &Identity,
    course: &CourseRef,
    block: &ContentBlock,
    body: serde_json::Value,
) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("PATCH")
        .uri(block_uri(course, block))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(who)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.send(request).await
}

async fn delete(
    app: &TestApp,
    who: &Identity,
    course: &CourseRef,
    block: &ContentBlock,
) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(block_uri(course, block))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(who)))
        .body(Body::empty())
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn test_list_contents_ordered_by_module_then_block() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let buyer = app.user(UserRole::Buyer);

    let course = app.content.add_course(seller.user_id);
    let second_module = app.content.add_module(course.id, 1);
    let first_module = app.content.add_module(course.id, 0);
    let c = app.content.add_block(second_module, "video", None, 0);
    let b = app.content.add_block(first_module, "pdf", None, 5);
    let a = app.content.add_block(first_module, "video", None, 2);

    app.entitlements
        .record(buyer.user_id, course.id, OrderStatus::Paid);

    let uri = format!("/api/courses/{}/contents", course.id);
    let response = app.get(&uri, Some(&app.token(&buyer)), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|block| block["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![a.id.to_string(), b.id.to_string(), c.id.to_string()]
    );
}

#[tokio::test]
async fn test_list_contents_requires_access() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let buyer = app.user(UserRole::Buyer);
    let (course, _) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let uri = format!("/api/courses/{}/contents", course.id);
    let response = app.get(&uri, Some(&app.token(&buyer)), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get(&uri, Some(&app.token(&seller)), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let missing = format!(
        "/api/courses/{}/contents",
        coursemart::coursemart_models::CourseId::new()
    );
    let response = app.get(&missing, Some(&app.token(&seller)), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_upload_replaces_file() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "old.mp4", &blob(10)).await;
    let old_key = block.content_url.clone().unwrap();
    assert!(app.blob_path(&old_key).exists());

    let data = blob(200_000);
    let response = upload(&app, &seller, &course, &block, "file", "Lesson 1.webm", &data).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let new_key = body["content_url"].as_str().unwrap().to_string();
    assert!(new_key.starts_with(&format!("courses/{}/", course.id)));
    assert!(new_key.ends_with("_Lesson_1.webm"));
    assert!(app.blob_path(&new_key).exists());
    assert!(!app.blob_path(&old_key).exists());

    let response = app
        .get(&stream_uri(&course, &block), Some(&app.token(&seller)), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "video/webm"
    );
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_upload_requires_ownership() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let buyer = app.user(UserRole::Buyer);
    let admin = app.user(UserRole::Admin);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    // A paid order lets a buyer watch, not edit.
    app.entitlements
        .record(buyer.user_id, course.id, OrderStatus::Paid);
    let response = upload(&app, &buyer, &course, &block, "file", "x.mp4", &blob(10)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "forbidden");

    let response = upload(&app, &admin, &course, &block, "file", "x.mp4", &blob(10)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_file_field_is_bad_request() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let response = upload(&app, &seller, &course, &block, "attachment", "x.mp4", &blob(10)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::spawn_with_max_upload(1024).await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let response = upload(&app, &seller, &course, &block, "file", "big.mp4", &blob(4096)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    // The block still points at its original file.
    let stored = app.content.block(block.id).unwrap();
    assert_eq!(stored.content_url, block.content_url);
}

#[tokio::test]
async fn test_patch_updates_metadata() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let response = patch(
        &app,
        &seller,
        &course,
        &block,
        json!({"title": "Introduction", "position": 3, "duration_seconds": 95}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "Introduction");
    assert_eq!(body["position"], 3);
    assert_eq!(body["duration_seconds"], 95);
    assert_eq!(body["block_type"], "video");
    assert_eq!(body["content_url"], block.content_url.clone().unwrap());
}

#[tokio::test]
async fn test_patch_rejects_invalid_values() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let response = patch(&app, &seller, &course, &block, json!({"position": -1})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_patch_by_non_owner_is_forbidden() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let other_seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;

    let response = patch(&app, &other_seller, &course, &block, json!({"title": "Mine"})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.content.block(block.id).unwrap().title, block.title);
}

#[tokio::test]
async fn test_patch_unknown_block_is_not_found() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, mut block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;
    block.id = ContentBlockId::new();

    let response = patch(&app, &seller, &course, &block, json!({"title": "x"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_block_and_file() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;
    let key = block.content_url.clone().unwrap();

    let response = delete(&app, &seller, &course, &block).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.content.block(block.id).is_none());
    assert!(!app.blob_path(&key).exists());

    let response = app
        .get(&stream_uri(&course, &block), Some(&app.token(&seller)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_survives_missing_file() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let admin = app.user(UserRole::Admin);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;
    std::fs::remove_file(app.blob_path(block.content_url.as_deref().unwrap())).unwrap();

    let response = delete(&app, &admin, &course, &block).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.content.block(block.id).is_none());
}

#[tokio::test]
async fn test_delete_by_buyer_is_forbidden() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let buyer = app.user(UserRole::Buyer);
    let (course, block) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;
    app.entitlements
        .record(buyer.user_id, course.id, OrderStatus::Paid);

    let response = delete(&app, &buyer, &course, &block).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.content.block(block.id).is_some());
    assert!(app.blob_path(block.content_url.as_deref().unwrap()).exists());
}

#[tokio::test]
async fn test_mutations_check_course_of_block() {
    let app = TestApp::spawn().await;
    let seller = app.user(UserRole::Seller);
    let (course_a, _) = app.seed_block(&seller, "video", "a.mp4", &blob(10)).await;
    let (_, block_b) = app.seed_block(&seller, "video", "b.mp4", &blob(10)).await;

    let response = delete(&app, &seller, &course_a, &block_b).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.content.block(block_b.id).is_some());
}
