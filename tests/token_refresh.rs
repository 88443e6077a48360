use std::collections::HashSet;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value, json};
use tower::ServiceExt;

use token_refresh::{
    app::{build_router, build_state},
    config::{AppEnv, Config},
};

const SECRET: &str = "integration-secret";

fn config(default_claims: Value) -> Config {
    let Value::Object(default_claims) = default_claims else {
        panic!("default claims must be an object");
    };

    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        jwt_secret: SECRET.to_string(),
        token_ttl_seconds: 1200,
        token_leeway_seconds: 0,
        default_claims,
    }
}

fn router(default_claims: Value) -> Router {
    let config = config(default_claims);
    let state = build_state(&config).unwrap();
    build_router(state, &config)
}

fn sign(alg: Algorithm, secret: &str, claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(alg),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Decodes the refreshed token on a response, checking its signature.
fn refreshed_claims(response: &Response<Body>) -> Map<String, Value> {
    let value = response
        .headers()
        .get(header::AUTHORIZATION)
        .expect("refreshed Authorization header")
        .to_str()
        .unwrap();
    let token = value.strip_prefix("Bearer ").expect("Bearer scheme");

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;

    jsonwebtoken::decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_fresh_exp(claims: &Map<String, Value>, before: i64) {
    let exp = claims["exp"].as_i64().expect("numeric exp");
    assert!(exp >= before + 1200, "exp {exp} too early");
    assert!(exp <= Utc::now().timestamp() + 1200, "exp {exp} too late");
}

#[tokio::test]
async fn no_header_gets_default_claims_and_a_fresh_token() {
    let before = Utc::now().timestamp();

    let response = router(json!({ "role": "guest" }))
        .oneshot(request("GET", "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let claims = refreshed_claims(&response);
    assert_eq!(claims.len(), 2);
    assert_eq!(claims["role"], json!("guest"));
    assert_fresh_exp(&claims, before);
}

#[tokio::test]
async fn handlers_see_exactly_the_defaults_without_a_token() {
    let response = router(json!({ "role": "guest", "prefs": { "lang": "en" } }))
        .oneshot(request("GET", "/api/v1/session", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "role": "guest", "prefs": { "lang": "en" } })
    );
}

#[tokio::test]
async fn expired_token_falls_back_to_defaults() {
    let expired = sign(
        Algorithm::HS256,
        SECRET,
        &json!({ "role": "admin", "exp": Utc::now().timestamp() - 3_600 }),
    );

    let response = router(json!({ "role": "guest" }))
        .oneshot(request("GET", "/api/v1/session", Some(&expired), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let claims = refreshed_claims(&response);
    assert_eq!(claims["role"], json!("guest"));
    assert_eq!(json_body(response).await, json!({ "role": "guest" }));
}

#[tokio::test]
async fn foreign_key_or_algorithm_is_treated_like_no_header() {
    let exp = Utc::now().timestamp() + 600;
    let payload = json!({ "role": "admin", "exp": exp });
    let tokens = [
        sign(Algorithm::HS256, "not-our-secret", &payload),
        sign(Algorithm::HS512, SECRET, &payload),
        "definitely.not.ajwt".to_string(),
    ];

    for token in tokens {
        let response = router(json!({ "role": "guest" }))
            .oneshot(request("GET", "/api/v1/session", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "role": "guest" }));
    }
}

#[tokio::test]
async fn token_issued_in_the_future_falls_back_to_defaults() {
    let future = sign(
        Algorithm::HS256,
        SECRET,
        &json!({ "role": "admin", "iat": Utc::now().timestamp() + 86_400 }),
    );

    let response = router(json!({ "role": "guest" }))
        .oneshot(request("GET", "/api/v1/session", Some(&future), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(refreshed_claims(&response)["role"], json!("guest"));
    assert_eq!(json_body(response).await, json!({ "role": "guest" }));
}

#[tokio::test]
async fn valid_token_claims_survive_except_exp() {
    let before = Utc::now().timestamp();
    let old_exp = before + 60;
    let token = sign(
        Algorithm::HS256,
        SECRET,
        &json!({ "role": "admin", "sub": "u-1", "iat": before - 10, "exp": old_exp }),
    );

    let response = router(json!({ "role": "guest" }))
        .oneshot(request("GET", "/api/v1/health", Some(&token), None))
        .await
        .unwrap();

    let claims = refreshed_claims(&response);
    assert_eq!(claims["role"], json!("admin"));
    assert_eq!(claims["sub"], json!("u-1"));
    assert_eq!(claims["iat"], json!(before - 10));
    assert_ne!(claims["exp"], json!(old_exp));
    assert_fresh_exp(&claims, before);
}

#[tokio::test]
async fn claim_set_by_handler_lands_in_refreshed_token() {
    let before = Utc::now().timestamp();
    let token = sign(
        Algorithm::HS256,
        SECRET,
        &json!({ "role": "admin", "exp": before + 600 }),
    );

    let response = router(json!({}))
        .oneshot(request(
            "PUT",
            "/api/v1/session/claims/visits",
            Some(&token),
            Some(json!(5)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let claims = refreshed_claims(&response);
    assert_eq!(claims["visits"], json!(5));
    assert_eq!(claims["role"], json!("admin"));
    assert_fresh_exp(&claims, before);
}

#[tokio::test]
async fn refreshed_token_carries_state_into_the_next_request() {
    let app = router(json!({ "role": "guest" }));

    let first = app
        .clone()
        .oneshot(request("POST", "/api/v1/session/visits", None, None))
        .await
        .unwrap();
    let token = first
        .headers()
        .get(header::AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .trim_start_matches("Bearer ")
        .to_string();
    assert_eq!(json_body(first).await, json!({ "visits": 1 }));

    let second = app
        .oneshot(request("POST", "/api/v1/session/visits", Some(&token), None))
        .await
        .unwrap();

    let claims = refreshed_claims(&second);
    assert_eq!(claims["visits"], json!(2));
    assert_eq!(claims["role"], json!("guest"));
    assert_eq!(json_body(second).await, json!({ "visits": 2 }));
}

#[tokio::test]
async fn failed_handler_gets_no_token() {
    let response = router(json!({ "role": "guest" }))
        .oneshot(request("DELETE", "/api/v1/session/claims/missing", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::AUTHORIZATION).is_none());
    assert_eq!(json_body(response).await["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn reserved_exp_claim_is_rejected_without_a_token() {
    let response = router(json!({}))
        .oneshot(request(
            "PUT",
            "/api/v1/session/claims/exp",
            None,
            Some(json!(0)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn deleting_a_claim_removes_it_from_the_token() {
    let token = sign(
        Algorithm::HS256,
        SECRET,
        &json!({ "role": "admin", "beta": true }),
    );

    let response = router(json!({}))
        .oneshot(request("DELETE", "/api/v1/session/claims/beta", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let claims = refreshed_claims(&response);
    assert!(!claims.contains_key("beta"));
    assert_eq!(claims["role"], json!("admin"));
}

#[tokio::test]
async fn browsers_can_read_the_refreshed_token() {
    let mut req = request("GET", "/api/v1/health", None, None);
    req.headers_mut()
        .insert(header::ORIGIN, "https://app.example".parse().unwrap());

    let response = router(json!({})).oneshot(req).await.unwrap();

    let exposed = response
        .headers()
        .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
        .expect("expose headers")
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("authorization"));
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
}
