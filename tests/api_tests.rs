use astrodata::config::Config;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "Abc123!.";

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("astrodata-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = astrodata::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    astrodata::api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Registers a user and returns `(id, api_key)`.
async fn register(app: &Router, first: &str, surname: &str, role: Option<&str>) -> (i64, String) {
    let mut payload = json!({
        "firstName": first,
        "surname": surname,
        "email": format!("{}@example.com", first.to_lowercase()),
        "password": PASSWORD,
    });
    if let Some(role) = role {
        payload["role"] = json!(role);
    }

    let (status, body) = send(app, "POST", "/api/v1/users", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let user = &body["user"];
    (
        user["id"].as_i64().unwrap(),
        user["apiKey"].as_str().unwrap().to_string(),
    )
}

fn astronaut(name: &str) -> Value {
    json!({
        "name": name,
        "year": 1978,
        "group": 8,
        "status": "Retired",
        "birthDate": "05/26/1951",
        "birthPlace": "Los Angeles, CA",
        "gender": "Female",
        "almaMater": ["Stanford University"],
        "graduateMajor": ["Physics"],
        "spaceFlights": 2,
        "spaceFlightHours": 343,
        "missions": ["STS-7", "STS-41G"]
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_rejected_keys_share_one_response() {
    let app = spawn_app().await;
    let unknown = "ab".repeat(32);

    for key in [None, Some("wrong-key"), Some(unknown.as_str())] {
        let (status, body) = send(&app, "GET", "/api/v1/astronauts", key, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "not authorized" }));
    }
}

#[tokio::test]
async fn test_registration_returns_user_without_password() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({
            "firstName": "Ada",
            "surname": "Lovelace",
            "email": "ada@x.com",
            "password": PASSWORD,
            "role": "superuser"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let user = &body["user"];
    assert!(user["id"].as_i64().unwrap() > 0);
    assert_eq!(user["role"], "user");
    assert_eq!(user["apiKey"].as_str().unwrap().len(), 64);
    assert!(user.get("password").is_none());
    assert!(user["createdAt"].is_string());
}

#[tokio::test]
async fn test_registration_validation_and_conflict() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({ "firstName": "Ada", "email": "nope", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.len() >= 4, "{errors:?}");

    register(&app, "Ada", "Lovelace", None).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({
            "firstName": "Ada",
            "surname": "Byron",
            "email": "ada@example.com",
            "password": PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_self_service_flow() {
    let app = spawn_app().await;
    let (ada_id, ada_key) = register(&app, "Ada", "Lovelace", None).await;
    let (alan_id, _) = register(&app, "Alan", "Turing", None).await;

    let uri = format!("/api/v1/users/{ada_id}");
    let (status, body) = send(&app, "GET", &uri, Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["surname"], "Lovelace");

    let other = format!("/api/v1/users/{alan_id}");
    let (status, _) = send(&app, "GET", &other, Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/users", Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&ada_key),
        Some(json!({ "surname": "King", "firstName": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["surname"], "King");
    assert_eq!(body["user"]["firstName"], "Ada");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{uri}/password"),
        Some(&ada_key),
        Some(json!({ "password": "Xyz789?!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "password updated");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{other}/password"),
        Some(&ada_key),
        Some(json!({ "password": "Xyz789?!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", &format!("{uri}/api-key"), Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["user"]["apiKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, ada_key);

    let (status, _) = send(&app, "GET", &uri, Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "DELETE", &uri, Some(&new_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user deleted");

    let (status, _) = send(&app, "GET", &uri, Some(&new_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = spawn_app().await;
    let (_, admin_key) = register(&app, "Grace", "Hopper", Some("admin")).await;
    let (ada_id, _) = register(&app, "Ada", "Lovelace", None).await;
    register(&app, "Alan", "Turing", None).await;

    let (status, body) = send(&app, "GET", "/api/v1/users?limit=2", Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::OK);
    let surnames: Vec<_> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["surname"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(surnames, vec!["Hopper", "Lovelace"]);

    let (status, _) = send(&app, "GET", "/api/v1/users?limit=0", Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/users/{ada_id}");
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin_key),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/v1/users/0", Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_astronaut_lifecycle() {
    let app = spawn_app().await;
    let (_, admin_key) = register(&app, "Grace", "Hopper", Some("admin")).await;
    let (_, user_key) = register(&app, "Ada", "Lovelace", None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/astronauts",
        Some(&user_key),
        Some(astronaut("Sally K. Ride")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut nameless = astronaut("");
    nameless["name"] = json!("");
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/astronauts",
        Some(&admin_key),
        Some(nameless),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().starts_with("name"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/astronauts",
        Some(&admin_key),
        Some(astronaut("Sally K. Ride")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = &body["astronaut"];
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "retired");
    assert_eq!(created["missions"], json!(["STS-7", "STS-41G"]));

    send(
        &app,
        "POST",
        "/api/v1/astronauts",
        Some(&admin_key),
        Some(astronaut("Guion S. Bluford Jr.")),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/v1/astronauts", Some(&user_key), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["astronauts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Guion S. Bluford Jr.", "Sally K. Ride"]);

    let uri = format!("/api/v1/astronauts/{id}");
    let (status, body) = send(&app, "GET", &uri, Some(&user_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["astronaut"]["almaMater"], json!(["Stanford University"]));

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&user_key),
        Some(json!({ "status": "deceased" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin_key),
        Some(json!({ "status": "Deceased", "birthPlace": "Encino, CA" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["astronaut"]["status"], "deceased");
    assert_eq!(body["astronaut"]["birthPlace"], "Encino, CA");
    assert_eq!(body["astronaut"]["birthDate"], "05/26/1951");

    let (status, _) = send(&app, "DELETE", &uri, Some(&user_key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "DELETE", &uri, Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "astronaut deleted");

    let (status, _) = send(&app, "DELETE", &uri, Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &uri, Some(&admin_key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_self_promotion_is_rejected() {
    let app = spawn_app().await;
    let (ada_id, ada_key) = register(&app, "Ada", "Lovelace", None).await;

    let uri = format!("/api/v1/users/{ada_id}");
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&ada_key),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "not authorized" }));

    let (status, body) = send(&app, "GET", &uri, Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let app = spawn_app().await;
    let (_, ada_key) = register(&app, "Ada", "Lovelace", None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["errors"][0].as_str().unwrap().starts_with("request body:"));

    let (status, body) = send(&app, "GET", "/api/v1/users/abc", Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().starts_with("path:"));

    let (status, body) =
        send(&app, "GET", "/api/v1/astronauts?limit=many", Some(&ada_key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0].as_str().unwrap().starts_with("query:"));
}
