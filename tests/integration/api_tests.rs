//! API integration tests, driving the router in-process over a fresh in-memory catalog

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_server::{api, repository::Repository, services::Services, AppConfig, AppState};

const BASE_URL: &str = "/api/v1";

fn app() -> Router {
    let services = Services::new(Repository::in_memory());
    api::create_router(AppState::new(AppConfig::default(), services))
}

/// Send one request and return the status with the decoded JSON body (Null when empty)
async fn send(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("{}{}", BASE_URL, path));
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn create(app: &Router, path: &str, body: Value) -> i64 {
    let (status, body) = send(app, Method::POST, path, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_book_crud() {
    let app = app();

    let id = create(
        &app,
        "/books",
        json!({"title": "1984", "numberOfPages": 328, "year": 1949}),
    )
    .await;
    assert_eq!(id, 1);

    let (status, body) = send(&app, Method::GET, "/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "title": "1984", "numberOfPages": 328, "year": 1949}));

    let update = json!({"title": "Nineteen Eighty-Four", "numberOfPages": 328, "year": 1949});
    let (status, body) = send(&app, Method::PUT, "/books/1", Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Nineteen Eighty-Four");
    let (_, again) = send(&app, Method::PUT, "/books/1", Some(update)).await;
    assert_eq!(body, again);

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");

    let (status, _) = send(&app, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_missing_entity_is_not_found() {
    let app = app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/authors/5",
        Some(json!({"fullName": "Homer"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/authors", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({"title": "Too long", "numberOfPages": 2501})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    // Missing required field
    let (status, body) = send(&app, Method::POST, "/authors", Some(json!({"country": "USA"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 18);

    let (status, _) = send(&app, Method::POST, "/genres", Some(json!({"naming": "X"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_author_link_scenario() {
    let app = app();

    create(&app, "/books", json!({"title": "1984", "numberOfPages": 328, "year": 1949})).await;
    create(&app, "/authors", json!({"fullName": "George Orwell", "country": "Great Britain"})).await;

    let (status, body) = send(&app, Method::POST, "/books/1/authors/1", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"bookId": 1, "authorId": 1}));

    let (status, body) = send(&app, Method::POST, "/books/1/authors/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let (status, body) = send(&app, Method::GET, "/authors/1/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], 1);

    let (status, body) = send(&app, Method::GET, "/books/1/authors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["fullName"], "George Orwell");

    // Links to missing entities
    let (status, _) = send(&app, Method::POST, "/books/2/authors/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, "/books/1/authors/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reassign_and_remove_author_link() {
    let app = app();

    create(&app, "/books", json!({"title": "Dandelion wine", "numberOfPages": 164})).await;
    create(&app, "/authors", json!({"fullName": "Ray Bradbury", "country": "USA"})).await;
    create(&app, "/authors", json!({"fullName": "Homer"})).await;
    send(&app, Method::POST, "/books/1/authors/2", None).await;
    send(&app, Method::POST, "/books/1/authors/1", None).await;

    let (status, _) = send(&app, Method::PUT, "/books/1/authors/2", Some(json!({"authorId": 1}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, "/books/1/authors/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/books/1/authors/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::PUT, "/books/1/authors/1", Some(json!({"authorId": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"bookId": 1, "authorId": 2}));

    let (_, body) = send(&app, Method::GET, "/authors/1/books", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 18);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = send(&app, Method::DELETE, "/authors/99999999999999999999", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 18);

    let (status, body) = send(&app, Method::POST, "/books/1/genres/x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_reassign_genre_link_and_list_book_genres() {
    let app = app();

    create(&app, "/books", json!({"title": "451 fahrenheit", "numberOfPages": 158})).await;
    for naming in ["Dystopia", "Fiction", "Epos"] {
        create(&app, "/genres", json!({"naming": naming})).await;
    }
    send(&app, Method::POST, "/books/1/genres/1", None).await;
    send(&app, Method::POST, "/books/1/genres/2", None).await;

    let (status, body) = send(&app, Method::GET, "/books/1/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "naming": "Dystopia"}, {"id": 2, "naming": "Fiction"}]));

    let (status, body) = send(&app, Method::PUT, "/books/1/genres/2", Some(json!({"genreId": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"bookId": 1, "genreId": 3}));

    let (status, _) = send(&app, Method::PUT, "/books/1/genres/3", Some(json!({"genreId": 1}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::PUT, "/books/1/genres/2", Some(json!({"genreId": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/books/1/genres/3", Some(json!({"genreId": 9}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::PUT, "/books/1/genres/3", Some(json!({"genreId": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"bookId": 1, "genreId": 3}));

    let (_, body) = send(&app, Method::GET, "/books/1/genres", None).await;
    assert_eq!(body, json!([{"id": 1, "naming": "Dystopia"}, {"id": 3, "naming": "Epos"}]));
    let (_, body) = send(&app, Method::GET, "/genres/2/books", None).await;
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, Method::GET, "/books/5/genres", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_genre_delete_guard_scenario() {
    let app = app();

    for title in ["451 fahrenheit", "1984", "Odyssey"] {
        create(&app, "/books", json!({"title": title, "numberOfPages": 100})).await;
    }
    create(&app, "/genres", json!({"naming": "Epos"})).await;

    let (status, _) = send(&app, Method::POST, "/books/3/genres/1", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::DELETE, "/genres/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let (_, body) = send(&app, Method::GET, "/genres/1/books", None).await;
    assert_eq!(body[0]["title"], "Odyssey");

    let (status, _) = send(&app, Method::DELETE, "/books/3/genres/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, "/genres/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_delete_book_cascades() {
    let app = app();

    create(&app, "/books", json!({"title": "451 fahrenheit", "numberOfPages": 158, "year": 1953})).await;
    create(&app, "/authors", json!({"fullName": "Ray Bradbury"})).await;
    create(&app, "/authors", json!({"fullName": "Guest Editor"})).await;
    create(&app, "/genres", json!({"naming": "Dystopia"})).await;
    send(&app, Method::POST, "/books/1/authors/1", None).await;
    send(&app, Method::POST, "/books/1/authors/2", None).await;
    send(&app, Method::POST, "/books/1/genres/1", None).await;

    let (status, _) = send(&app, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for path in ["/authors/1/books", "/authors/2/books", "/genres/1/books"] {
        let (status, body) = send(&app, Method::GET, path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]), "{}", path);
    }

    let (_, authors) = send(&app, Method::GET, "/authors", None).await;
    assert_eq!(authors.as_array().map(Vec::len), Some(2));

    // Nothing references the genre any more
    let (status, _) = send(&app, Method::DELETE, "/genres/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_missing_author_is_not_found() {
    let app = app();
    create(&app, "/authors", json!({"fullName": "Homer", "country": "Ancient Greece"})).await;

    let (status, body) = send(&app, Method::DELETE, "/authors/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5);

    let (_, body) = send(&app, Method::GET, "/authors", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.oneshot(request).await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["info"]["title"], "Bookshelf API");
    assert!(doc["paths"]["/books/{id}/genres/{genre_id}"].is_object());
}
