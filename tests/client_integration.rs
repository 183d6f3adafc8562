use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json, Router,
};
use picklecart_api::{ApiClient, ApiError, ApiRequest, ClientOptions, Credentials};
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: JsonValue,
    headers: Vec<(&'static str, String)>,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    hits: Arc<AtomicUsize>,
    hit_times: Arc<Mutex<Vec<Instant>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

async fn mock_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    _body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .hit_times
        .lock()
        .expect("hit time mutex must not be poisoned")
        .push(Instant::now());
    state
        .auth_headers
        .lock()
        .expect("auth header mutex must not be poisoned")
        .push(
            headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        );

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    let mut reply_headers = HeaderMap::new();
    for (name, value) in &response.headers {
        reply_headers.insert(*name, value.parse().expect("header value must parse"));
    }
    (response.status, reply_headers, Json(response.body))
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    hit_times: Arc<Mutex<Vec<Instant>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn dispatch_gaps(&self) -> Vec<Duration> {
        let times = self
            .hit_times
            .lock()
            .expect("hit time mutex must not be poisoned");
        times.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(AtomicUsize::new(0)),
        hit_times: Arc::new(Mutex::new(Vec::new())),
        auth_headers: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new().fallback(mock_handler).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        hit_times: state.hit_times,
        auth_headers: state.auth_headers,
        task,
    }
}

/// Accepts connections and drops the first `drops` of them before any
/// response bytes, producing transport-level failures. Later connections get
/// a real HTTP response.
struct DropServer {
    base_url: String,
    attempts: Arc<AtomicUsize>,
    attempt_times: Arc<Mutex<Vec<Instant>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for DropServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn spawn_drop_server(drops: usize, body: JsonValue) -> DropServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempt_times = Arc::new(Mutex::new(Vec::new()));

    let task = {
        let attempts = attempts.clone();
        let attempt_times = attempt_times.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                attempt_times
                    .lock()
                    .expect("attempt time mutex must not be poisoned")
                    .push(Instant::now());

                if attempt <= drops {
                    drop(socket);
                    continue;
                }

                let mut buffer = vec![0u8; 4096];
                let mut request = Vec::new();
                loop {
                    match socket.read(&mut buffer).await {
                        Ok(0) => break,
                        Ok(n) => {
                            request.extend_from_slice(&buffer[..n]);
                            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }

                let payload = body.to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        })
    };

    DropServer {
        base_url: format!("http://{address}"),
        attempts,
        attempt_times,
        task,
    }
}

/// Options with throttling disabled and fast backoff, for tests that are not
/// about pacing.
fn fast_options() -> ClientOptions {
    ClientOptions {
        timeout_ms: 2_000,
        max_retries: 3,
        retry_base_delay_ms: 30,
        min_request_interval_ms: 0,
        rate_limit_fallback_secs: 1,
    }
}

fn client(base_url: &str, options: ClientOptions) -> ApiClient {
    ApiClient::new(base_url).with_options(options)
}

#[tokio::test]
async fn back_to_back_requests_are_spaced_by_the_minimum_interval() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::OK, json!([])),
        MockResponse::json(StatusCode::OK, json!([])),
        MockResponse::json(StatusCode::OK, json!([])),
    ])
    .await;

    let api = client(
        &server.base_url,
        ClientOptions {
            min_request_interval_ms: 150,
            ..fast_options()
        },
    );

    for _ in 0..3 {
        api.send(ApiRequest::get("/products"))
            .await
            .expect("request must succeed");
    }

    let gaps = server.dispatch_gaps();
    assert_eq!(gaps.len(), 2);
    for gap in gaps {
        assert!(gap >= Duration::from_millis(140), "gap was {gap:?}");
    }
}

#[tokio::test]
async fn concurrent_requests_observe_the_shared_throttle_baseline() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::OK, json!([])),
        MockResponse::json(StatusCode::OK, json!([])),
        MockResponse::json(StatusCode::OK, json!([])),
    ])
    .await;

    let api = client(
        &server.base_url,
        ClientOptions {
            min_request_interval_ms: 120,
            ..fast_options()
        },
    );

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move { api.send(ApiRequest::get("/products")).await })
        })
        .collect();
    for task in tasks {
        task.await
            .expect("request task must not panic")
            .expect("request must succeed");
    }

    let gaps = server.dispatch_gaps();
    assert_eq!(gaps.len(), 2);
    for gap in gaps {
        assert!(gap >= Duration::from_millis(110), "gap was {gap:?}");
    }
}

#[tokio::test]
async fn rate_limited_request_waits_for_retry_after_then_resends_once() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"}))
            .with_header("retry-after", "1"),
        MockResponse::json(StatusCode::OK, json!({"message": "ok"})),
    ])
    .await;

    let api = client(&server.base_url, fast_options());
    let start = Instant::now();
    let body = api
        .send(ApiRequest::get("/products"))
        .await
        .expect("request must succeed after backoff");

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
    assert!(body.contains("ok"));
}

#[tokio::test]
async fn repeated_rate_limits_recurse_without_consuming_the_retry_budget() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"}))
            .with_header("retry-after", "1"),
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"}))
            .with_header("retry-after", "1"),
        MockResponse::json(StatusCode::OK, json!({"message": "ok"})),
    ])
    .await;

    // Zero transport retries: only the budget-free 429 path can resend.
    let api = client(
        &server.base_url,
        ClientOptions {
            max_retries: 0,
            ..fast_options()
        },
    );

    let start = Instant::now();
    let body = api
        .send(ApiRequest::get("/products"))
        .await
        .expect("request must succeed after repeated backoff");

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(server.hits.load(Ordering::SeqCst), 3);
    assert!(body.contains("ok"));
}

#[tokio::test]
async fn rate_limit_without_header_uses_the_configured_fallback() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"})),
        MockResponse::json(StatusCode::OK, json!({"message": "ok"})),
    ])
    .await;

    let api = client(&server.base_url, fast_options());
    let start = Instant::now();
    api.send(ApiRequest::get("/products"))
        .await
        .expect("request must succeed after fallback backoff");

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bearer_header_is_attached_iff_a_token_is_stored() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::OK, json!([])),
        MockResponse::json(StatusCode::OK, json!([])),
    ])
    .await;

    let api = client(&server.base_url, fast_options());
    api.send(ApiRequest::get("/products"))
        .await
        .expect("anonymous request must succeed");

    api.session().set_token("abc123");
    api.send(ApiRequest::get("/products"))
        .await
        .expect("authenticated request must succeed");

    let recorded = server
        .auth_headers
        .lock()
        .expect("auth header mutex must not be poisoned")
        .clone();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0], None);
    assert_eq!(recorded[1].as_deref(), Some("Bearer abc123"));
}

#[tokio::test]
async fn unauthorized_response_clears_the_session_and_fires_the_hook_once() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::UNAUTHORIZED,
        json!({"error": "token expired"}),
    )])
    .await;

    let expirations = Arc::new(AtomicUsize::new(0));
    let observed = expirations.clone();
    let api = client(&server.base_url, fast_options())
        .on_session_expired(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

    api.session().set_token("stale-token");
    let err = api
        .send(ApiRequest::get("/orders"))
        .await
        .expect_err("request must fail");

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(api.session().token(), None);
    assert!(api.current_user().is_none());
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn other_http_errors_surface_verbatim_without_retry() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "boom"}),
    )])
    .await;

    let api = client(&server.base_url, fast_options());
    let err = api
        .send(ApiRequest::get("/products"))
        .await
        .expect_err("request must fail");

    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected http error, got {other:?}"),
    }
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transport_failures_retry_with_growing_delays_then_succeed() {
    let server = spawn_drop_server(2, json!({"message": "recovered"})).await;

    let api = client(&server.base_url, fast_options());
    let body = api
        .send(ApiRequest::get("/products"))
        .await
        .expect("request must succeed after retries");

    assert!(body.contains("recovered"));
    assert_eq!(server.attempts.load(Ordering::SeqCst), 3);

    let times = server
        .attempt_times
        .lock()
        .expect("attempt time mutex must not be poisoned")
        .clone();
    assert_eq!(times.len(), 3);
    // Linear backoff: 1 × base before attempt 2, 2 × base before attempt 3.
    assert!(times[1] - times[0] >= Duration::from_millis(25));
    assert!(times[2] - times[1] >= Duration::from_millis(55));
}

#[tokio::test]
async fn exhausted_retry_budget_surfaces_the_transport_error() {
    let server = spawn_drop_server(usize::MAX, json!({})).await;

    let api = client(
        &server.base_url,
        ClientOptions {
            max_retries: 2,
            retry_base_delay_ms: 20,
            ..fast_options()
        },
    );

    let start = Instant::now();
    let err = api
        .send(ApiRequest::get("/products"))
        .await
        .expect_err("request must fail");

    assert!(matches!(err, ApiError::Transport(_)));
    // Initial attempt plus exactly two retries.
    assert_eq!(server.attempts.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn login_persists_the_token_and_identity() {
    let server = spawn_server(vec![
        MockResponse::json(
            StatusCode::OK,
            json!({
                "token": "t1",
                "user": {"_id": "u1", "name": "Kit", "email": "kit@example.com"}
            }),
        ),
        MockResponse::json(StatusCode::OK, json!([])),
    ])
    .await;

    let api = client(&server.base_url, fast_options());
    let auth = api
        .login(&Credentials {
            email: "kit@example.com".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await
        .expect("login must succeed");

    assert_eq!(auth.user.name, "Kit");
    assert_eq!(api.session().token().as_deref(), Some("t1"));
    assert_eq!(
        api.current_user().map(|user| user.id),
        Some("u1".to_owned())
    );

    api.orders().await.expect("orders must succeed");
    let recorded = server
        .auth_headers
        .lock()
        .expect("auth header mutex must not be poisoned")
        .clone();
    assert_eq!(recorded[1].as_deref(), Some("Bearer t1"));

    api.logout();
    assert_eq!(api.session().token(), None);
}
