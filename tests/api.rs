// End-to-end tests: every request goes through the real router against an
// in-memory store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_market::app_state::AppState;
use campus_market::config::{Config, DatabaseConfig, ServerConfig};
use campus_market::routes;

async fn test_app() -> Router {
    let config = Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
    };
    let state = AppState::new(config).await.unwrap();
    routes::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    clerk_user: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(clerk) = clerk_user {
        builder = builder.header("x-clerk-user-id", clerk);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, clerk: &str, username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/users/create",
        Some(json!({
            "clerkUserId": clerk,
            "username": username,
            "email": format!("{}@campus.edu", username),
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_product(app: &Router, seller_clerk: &str, title: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/products/create",
        Some(json!({
            "title": title,
            "description": "test listing",
            "price": { "amount": 20.0, "currency": "USD" },
            "category": "Books",
            "sellerClerkId": seller_clerk,
            "condition": "Good",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn health_is_reachable() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn created_user_is_immediately_retrievable() {
    let app = test_app().await;
    let created = create_user(&app, "u1", "alice").await;
    assert!(created["id"].as_i64().unwrap() > 0);

    let (status, fetched) = send(&app, "GET", "/api/users/user/u1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["username"], "alice");
    assert_eq!(fetched["savedProducts"], json!([]));
}

#[tokio::test]
async fn duplicate_user_identity_is_a_conflict() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;

    // Same clerk id, fresh username/email.
    let (status, _) = send(
        &app,
        "POST",
        "/api/users/create",
        Some(json!({
            "clerkUserId": "u1",
            "username": "alice2",
            "email": "alice2@campus.edu",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Same username, fresh clerk id/email.
    let (status, _) = send(
        &app,
        "POST",
        "/api/users/create",
        Some(json!({
            "clerkUserId": "u9",
            "username": "alice",
            "email": "other@campus.edu",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_username_is_a_validation_error() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/users/create",
        Some(json!({
            "clerkUserId": "u1",
            "username": "  ",
            "email": "a@campus.edu",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("username"));
}

#[tokio::test]
async fn patch_replaces_named_fields_only() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;

    let (status, updated) = send(
        &app,
        "PATCH",
        "/api/users/u1",
        Some(json!({ "username": "alice_m" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["username"], "alice_m");
    assert_eq!(updated["email"], "alice@campus.edu");
}

#[tokio::test]
async fn follow_twice_conflicts_and_followers_has_one_entry() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let bob_id = bob["id"].as_i64().unwrap();

    let uri = format!("/api/follow/{}", bob_id);
    let (status, _) = send(&app, "POST", &uri, None, Some("u1")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", &uri, None, Some("u1")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, followers) =
        send(&app, "GET", &format!("/api/followers/{}", bob_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let followers = followers.as_array().unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0]["clerkUserId"], "u1");

    let (status, followings) =
        send(&app, "GET", "/api/followings/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followings.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn follow_requires_identity_header() {
    let app = test_app().await;
    let bob = create_user(&app, "u2", "bob").await;
    let uri = format!("/api/follow/{}", bob["id"].as_i64().unwrap());
    let (status, _) = send(&app, "POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn favorite_toggle_keeps_counter_and_list_in_sync() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;
    create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Lamp").await;
    let product_id = product["id"].as_i64().unwrap();
    assert_eq!(product["saves"], 0);

    let fav_uri = format!("/api/users/favorites/u1/{}", product_id);
    let (status, saved) = send(&app, "POST", &fav_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["saves"], 1);

    // Saving again must not double-count.
    let (_, saved_again) = send(&app, "POST", &fav_uri, None, None).await;
    assert_eq!(saved_again["saves"], 1);

    let (status, list) = send(&app, "GET", "/api/users/favorites/u1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"].as_i64().unwrap(), product_id);

    let (status, removed) = send(&app, "DELETE", &fav_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["saves"], 0);

    let (_, list) = send(&app, "GET", "/api/users/favorites/u1", None, None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn conversation_create_is_idempotent() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Bike").await;

    let payload = json!({
        "participantIds": [alice["id"], bob["id"]],
        "productId": product["id"],
    });
    let (status, first) = send(
        &app,
        "POST",
        "/api/conversations/create",
        Some(payload.clone()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, second) = send(&app, "POST", "/api/conversations/create", Some(payload), None).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["participants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn message_updates_conversation_last_message() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Bike").await;

    let (_, conversation) = send(
        &app,
        "POST",
        "/api/conversations/create",
        Some(json!({
            "participantIds": [alice["id"], bob["id"]],
            "productId": product["id"],
        })),
        None,
    )
    .await;
    let conversation_id = conversation["id"].as_i64().unwrap();
    assert!(conversation["lastMessage"].is_null());

    let (status, message) = send(
        &app,
        "POST",
        "/api/messages",
        Some(json!({
            "conversationId": conversation_id,
            "senderId": alice["id"],
            "receiverId": bob["id"],
            "content": "is the bike still available?",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["isRead"], false);

    let (status, messages) = send(
        &app,
        "GET",
        &format!("/api/messages/{}", conversation_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], message["id"]);

    let alice_id = alice["id"].as_i64().unwrap();
    let (_, conversations) = send(
        &app,
        "GET",
        &format!("/api/conversations/user/{}", alice_id),
        None,
        None,
    )
    .await;
    let conversations = conversations.as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["lastMessage"]["id"], message["id"]);

    // Receiver marks the thread read.
    let (status, marked) = send(
        &app,
        "PUT",
        &format!("/api/messages/read/{}", conversation_id),
        None,
        Some("u2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 1);
}

#[tokio::test]
async fn deleted_conversation_leaves_list_but_keeps_history() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;

    let (_, conversation) = send(
        &app,
        "POST",
        "/api/conversations/create",
        Some(json!({ "participantIds": [alice["id"], bob["id"]] })),
        None,
    )
    .await;
    let conversation_id = conversation["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/api/messages",
        Some(json!({
            "conversationId": conversation_id,
            "senderId": alice["id"],
            "receiverId": bob["id"],
            "content": "hello",
        })),
        None,
    )
    .await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/conversations/{}", conversation_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, conversations) = send(
        &app,
        "GET",
        &format!("/api/conversations/user/{}", alice["id"].as_i64().unwrap()),
        None,
        None,
    )
    .await;
    assert!(conversations.as_array().unwrap().is_empty());

    // Messages of the deleted conversation are still readable.
    let (status, messages) = send(
        &app,
        "GET",
        &format!("/api/messages/{}", conversation_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_product_preserves_transactions() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Bike").await;
    let product_id = product["id"].as_i64().unwrap();

    let (status, transaction) = send(
        &app,
        "POST",
        "/api/transactions/create",
        Some(json!({
            "buyerId": alice["id"],
            "sellerId": bob["id"],
            "productId": product_id,
            "price": { "amount": 20.0, "currency": "USD" },
            "paymentMethod": "cash",
            "deliveryMethod": "meetup",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let transaction_id = transaction["id"].as_i64().unwrap();
    assert_eq!(transaction["status"], "Pending");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/products/delete/{}", product_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/products/id/{}", product_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The transaction survives with its product reference cleared.
    let (status, fetched) = send(
        &app,
        "GET",
        &format!("/api/transactions/{}", transaction_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched["productId"].is_null());
    assert_eq!(fetched["buyer"]["clerkUserId"], "u1");
}

#[tokio::test]
async fn deleting_product_preserves_message_history() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Bike").await;
    let product_id = product["id"].as_i64().unwrap();

    let (_, conversation) = send(
        &app,
        "POST",
        "/api/conversations/create",
        Some(json!({
            "participantIds": [alice["id"], bob["id"]],
            "productId": product_id,
        })),
        None,
    )
    .await;
    let conversation_id = conversation["id"].as_i64().unwrap();

    let (status, message) = send(
        &app,
        "POST",
        "/api/messages",
        Some(json!({
            "conversationId": conversation_id,
            "senderId": alice["id"],
            "receiverId": bob["id"],
            "content": "still for sale?",
            "productId": product_id,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["productId"].as_i64().unwrap(), product_id);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/products/delete/{}", product_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The message survives with its product reference cleared.
    let (status, messages) = send(
        &app,
        "GET",
        &format!("/api/messages/{}", conversation_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "still for sale?");
    assert!(messages[0]["productId"].is_null());
}

#[tokio::test]
async fn mark_read_on_unknown_conversation_is_not_found() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;

    let (status, _) = send(&app, "PUT", "/api/messages/read/999", None, Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_product_update_is_rejected() {
    let app = test_app().await;
    create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Lamp").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/products/update/{}", product["id"].as_i64().unwrap()),
        Some(json!({})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no fields"));
}

#[tokio::test]
async fn transaction_status_is_the_only_mutable_field() {
    let app = test_app().await;
    let alice = create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;

    let (_, transaction) = send(
        &app,
        "POST",
        "/api/transactions/create",
        Some(json!({
            "buyerId": alice["id"],
            "sellerId": bob["id"],
            "price": { "amount": 5.0, "currency": "USD" },
            "paymentMethod": "cash",
            "deliveryMethod": "pickup",
        })),
        None,
    )
    .await;
    let transaction_id = transaction["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/transactions/update/{}", transaction_id),
        Some(json!({ "status": "Completed" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Completed");
    assert_eq!(updated["price"]["amount"], 5.0);

    let (_, by_buyer) = send(
        &app,
        "GET",
        &format!("/api/transactions/buyer/{}", alice["id"].as_i64().unwrap()),
        None,
        None,
    )
    .await;
    assert_eq!(by_buyer.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn browse_feed_excludes_own_listings() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;
    create_user(&app, "u2", "bob").await;
    create_product(&app, "u1", "Alice's book").await;
    create_product(&app, "u2", "Bob's lamp").await;

    let (status, feed) = send(&app, "GET", "/api/products/u1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["title"], "Bob's lamp");

    let (_, mine) = send(&app, "GET", "/api/products/my/u1", None, None).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["title"], "Alice's book");
}

#[tokio::test]
async fn sold_products_drop_out_of_the_feed() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;
    create_user(&app, "u2", "bob").await;
    let product = create_product(&app, "u2", "Bob's lamp").await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/products/update/{}", product["id"].as_i64().unwrap()),
        Some(json!({ "status": "Sold" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Sold");

    let (_, feed) = send(&app, "GET", "/api/products/u1", None, None).await;
    assert!(feed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn post_like_toggles_and_comments_append() {
    let app = test_app().await;
    create_user(&app, "u1", "alice").await;
    let bob = create_user(&app, "u2", "bob").await;
    let bob_id = bob["id"].as_i64().unwrap();

    let (status, post) = send(
        &app,
        "POST",
        "/api/posts/create",
        Some(json!({
            "authorClerkId": "u1",
            "content": "selling everything before graduation",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_i64().unwrap();

    let like_uri = format!("/api/posts/like/{}", post_id);
    let (_, liked) = send(&app, "PUT", &like_uri, None, Some("u2")).await;
    assert_eq!(liked["likes"], json!([bob_id]));

    let (_, unliked) = send(&app, "PUT", &like_uri, None, Some("u2")).await;
    assert_eq!(unliked["likes"], json!([]));

    let (status, commented) = send(
        &app,
        "PUT",
        &format!("/api/posts/comment/{}", post_id),
        Some(json!({ "content": "what about the couch?" })),
        Some("u2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comments = commented["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["user"]["username"], "bob");

    let (_, all) = send(&app, "GET", "/api/posts", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn image_upload_records_url_verbatim() {
    let app = test_app().await;
    let (status, image) = send(
        &app,
        "POST",
        "/api/images/upload",
        Some(json!({
            "userId": "u1",
            "imageUrl": "https://res.cloudinary.com/demo/image/upload/v1/lamp.jpg",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(image["userId"], "u1");
    assert_eq!(
        image["imageUrl"],
        "https://res.cloudinary.com/demo/image/upload/v1/lamp.jpg"
    );
}

#[tokio::test]
async fn seed_populates_locations_once() {
    let app = test_app().await;
    let (status, summary) = send(&app, "POST", "/api/seed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["countries"], 3);
    assert_eq!(summary["users"], 3);

    let (_, countries) = send(&app, "GET", "/api/locations/countries", None, None).await;
    let countries = countries.as_array().unwrap();
    assert_eq!(countries.len(), 3);

    let country_id = countries[0]["id"].as_i64().unwrap();
    let (_, cities) = send(
        &app,
        "GET",
        &format!("/api/locations/cities/{}", country_id),
        None,
        None,
    )
    .await;
    assert!(!cities.as_array().unwrap().is_empty());

    let city_id = cities.as_array().unwrap()[0]["id"].as_i64().unwrap();
    let (_, universities) = send(
        &app,
        "GET",
        &format!("/api/locations/universities/{}", city_id),
        None,
        None,
    )
    .await;
    assert!(!universities.as_array().unwrap().is_empty());

    // Re-seeding an already populated store is a no-op.
    let (_, again) = send(&app, "POST", "/api/seed", None, None).await;
    assert_eq!(again["countries"], 0);
}
