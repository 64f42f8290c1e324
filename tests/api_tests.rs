use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use anihub::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20240102_seed_admin.rs)
const DEFAULT_API_KEY: &str = "anihub_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = anihub::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    anihub::api::router(state).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        request = request.header("X-Api-Key", key);
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, username: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@bebop.test"),
            "password": "swordfish-ii",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["data"]["user"]["id"].as_i64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_string(),
    )
}

async fn create_anime(app: &Router, title: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/anime",
        Some(DEFAULT_API_KEY),
        Some(json!({ "title": title, "genre": "Sci-Fi, Action", "studio": "Sunrise", "episodes": 26 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_anime_writes_require_admin() {
    let app = spawn_app().await;
    let payload = json!({ "title": "Cowboy Bebop" });

    let (status, _) = send(&app, "POST", "/api/anime", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/api/anime", Some("wrong-key"), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = register(&app, "spike").await;
    let (status, body) = send(&app, "POST", "/api/anime", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_anime_crud() {
    let app = spawn_app().await;
    let id = create_anime(&app, "Planetes").await;
    let uri = format!("/api/anime/{id}");

    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Planetes");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(DEFAULT_API_KEY),
        Some(json!({ "rating": 8.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 8.5);
    assert_eq!(body["data"]["title"], "Planetes");

    let (status, _) = send(&app, "PUT", &uri, Some(DEFAULT_API_KEY), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", "/api/anime/999", Some(DEFAULT_API_KEY), Some(json!({ "rating": 1.0 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anime_list_pagination() {
    let app = spawn_app().await;
    for title in ["Eureka Seven", "Akira", "Dorohedoro", "Baccano", "Claymore"] {
        create_anime(&app, title).await;
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/anime?page=1&limit=2&sortBy=title&sortOrder=ASC",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Akira", "Baccano"]);
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 2, "total": 5, "totalPages": 3, "hasNext": true, "hasPrev": false })
    );

    let (_, body) = send(&app, "GET", "/api/anime?page=3&limit=2&sortBy=title", None, None).await;
    assert_eq!(body["data"][0]["title"], "Eureka Seven");
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrev"], true);

    let (status, body) = send(&app, "GET", "/api/anime?page=9&limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total"], 5);

    // Garbage paging input falls back to the defaults
    let (status, body) = send(&app, "GET", "/api/anime?page=abc&limit=0", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    let (_, body) = send(&app, "GET", "/api/anime?limit=5000", None, None).await;
    assert_eq!(body["pagination"]["limit"], 100);

    let (status, body) = send(
        &app,
        "GET",
        "/api/anime?page=9223372036854775807&limit=10",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["page"], i64::MAX);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["hasNext"], false);

    // The server is still serving
    let (status, _) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_huge_page_on_every_list() {
    let app = spawn_app().await;
    let anime_id = create_anime(&app, "Haibane Renmei").await;
    let (user_id, token) = register(&app, "rakka").await;
    let huge = "page=9223372036854775807&limit=100";

    send(
        &app,
        "POST",
        "/api/threads",
        Some(&token),
        Some(json!({ "anime_id": anime_id, "title": "Wings", "content": "Grey." })),
    )
    .await;

    for (uri, key) in [
        (format!("/api/threads/anime/{anime_id}?{huge}"), None),
        (format!("/api/users?{huge}"), Some(DEFAULT_API_KEY)),
        (format!("/api/watchlist/{user_id}?{huge}"), Some(token.as_str())),
    ] {
        let (status, body) = send(&app, "GET", &uri, key, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert_eq!(body["data"], json!([]), "{uri}");
    }
}

#[tokio::test]
async fn test_anime_filters_are_injection_safe() {
    let app = spawn_app().await;
    create_anime(&app, "Trigun").await;
    create_anime(&app, "100% Ojousama").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/anime?search=%27%20OR%20%271%27%3D%271",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&app, "GET", "/api/anime?search=100%25", None, None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "100% Ojousama");

    create_anime(&app, "Ōkami Kakushi").await;
    let (_, body) = send(&app, "GET", "/api/anime?search=%C5%8Ckami", None, None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Ōkami Kakushi");

    let (_, body) = send(&app, "GET", "/api/anime?genre=sci-fi", None, None).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (status, body) = send(
        &app,
        "GET",
        "/api/anime?sortBy=title%3B%20DROP%20TABLE%20anime&sortOrder=sideways",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["title"], "100% Ojousama");

    let (_, body) = send(&app, "GET", "/api/anime", None, None).await;
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_register_login_and_session() {
    let app = spawn_app().await;
    let (_, token) = register(&app, "faye").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "faye", "email": "other@bebop.test", "password": "swordfish-ii" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "faye", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "faye", "password": "swordfish-ii" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let login: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(login["data"]["token"], token.as_str());
    assert!(login["data"]["user"].get("password_hash").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "faye");

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/api/auth/api-key/regenerate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(fresh, token);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_updates_and_admin_listing() {
    let app = spawn_app().await;
    let (spike_id, spike) = register(&app, "spike").await;
    let (jet_id, _) = register(&app, "jet").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{spike_id}"),
        Some(&spike),
        Some(json!({ "bio": "Whatever happens, happens." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "Whatever happens, happens.");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{jet_id}"),
        Some(&spike),
        Some(json!({ "bio": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PUT", &format!("/api/users/{spike_id}"), Some(&spike), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{spike_id}"),
        Some(&spike),
        Some(json!({ "email": "jet@bebop.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "GET", "/api/users", Some(&spike), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "GET",
        "/api/users?search=BEBOP&sortBy=username&sortOrder=asc",
        Some(DEFAULT_API_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["data"][0]["username"], "jet");
}

#[tokio::test]
async fn test_watchlist_duplicate_is_conflict() {
    let app = spawn_app().await;
    let anime_id = create_anime(&app, "Cowboy Bebop").await;
    let (user_id, token) = register(&app, "ein").await;

    let entry = json!({ "anime_id": anime_id, "status": "watching", "rating": 5, "progress": 3 });
    let (status, _) = send(&app, "POST", "/api/watchlist", Some(&token), Some(entry)).await;
    assert_eq!(status, StatusCode::CREATED);

    let again = json!({ "anime_id": anime_id, "status": "dropped" });
    let (status, _) = send(&app, "POST", "/api/watchlist", Some(&token), Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", &format!("/api/watchlist/{user_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "watching");
    assert_eq!(body["data"][0]["anime"]["title"], "Cowboy Bebop");

    let (status, _) = send(
        &app,
        "POST",
        "/api/watchlist",
        Some(&token),
        Some(json!({ "anime_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/watchlist",
        Some(&token),
        Some(json!({ "anime_id": anime_id, "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, other) = register(&app, "vicious").await;
    let (status, _) = send(&app, "GET", &format!("/api/watchlist/{user_id}"), Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/watchlist/{anime_id}"),
        Some(&token),
        Some(json!({ "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/watchlist/{anime_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/watchlist/{anime_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_forum_flow_and_anime_cascade() {
    let app = spawn_app().await;
    let anime_id = create_anime(&app, "Trigun").await;
    let keep_id = create_anime(&app, "Gungrave").await;
    let (user_id, token) = register(&app, "vash").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/threads",
        Some(&token),
        Some(json!({ "anime_id": anime_id, "title": "Best episode?", "content": "Go." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let thread_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/comments",
        Some(&token),
        Some(json!({ "thread_id": thread_id, "content": "Episode 24." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, "PUT", &format!("/api/comments/{comment_id}/upvote"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["upvotes"], 1);

    let (_, body) = send(&app, "GET", &format!("/api/threads/{thread_id}"), None, None).await;
    assert_eq!(body["data"]["view_count"], 1);

    let (_, body) = send(&app, "GET", &format!("/api/threads/anime/{anime_id}"), None, None).await;
    assert_eq!(body["pagination"]["total"], 1);

    send(
        &app,
        "POST",
        "/api/watchlist",
        Some(&token),
        Some(json!({ "anime_id": anime_id })),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/api/anime/{anime_id}"), Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/threads/{thread_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/api/comments/thread/{thread_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/api/watchlist/{user_id}"), Some(&token), None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (status, _) = send(&app, "GET", &format!("/api/anime/{keep_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_locked_thread_rejects_comments() {
    let app = spawn_app().await;
    let (_, token) = register(&app, "wolfwood").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/threads",
        Some(&token),
        Some(json!({ "title": "General", "content": "Anything goes" })),
    )
    .await;
    let thread_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/threads/{thread_id}");

    let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "is_locked": true }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &uri, Some(DEFAULT_API_KEY), Some(json!({ "is_locked": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_locked"], true);

    let (status, _) = send(
        &app,
        "POST",
        "/api/comments",
        Some(&token),
        Some(json!({ "thread_id": thread_id, "content": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &uri, Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_user_cascade_via_api() {
    let app = spawn_app().await;
    let anime_id = create_anime(&app, "Samurai Champloo").await;
    let (mugen_id, mugen) = register(&app, "mugen").await;
    let (_, jin) = register(&app, "jin").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/threads",
        Some(&mugen),
        Some(json!({ "anime_id": anime_id, "title": "Sunflower samurai", "content": "?" })),
    )
    .await;
    let thread_id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/api/comments",
        Some(&jin),
        Some(json!({ "thread_id": thread_id, "content": "reply from jin" })),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/api/users/{mugen_id}"), Some(&jin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/api/users/{mugen_id}"), Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/threads/{thread_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&mugen), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "DELETE", &format!("/api/users/{mugen_id}"), Some(DEFAULT_API_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
