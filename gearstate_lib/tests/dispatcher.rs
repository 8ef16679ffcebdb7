use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use gearstate_lib::http::{ApiError, Dispatcher, HttpError, Request, Transport, TransportError, TransportResponse};
use gearstate_lib::ratelimit::BucketKey;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted transport
// ============================================================================

enum Reply {
    Response(TransportResponse),
    Fail,
}

/// Plays back canned replies in order and records when each call happened
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    fn new(replies: Vec<Reply>) -> Self {
        ScriptedTransport {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        self.calls.lock().push((request.path.clone(), Instant::now()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fail) => Err(TransportError::Other("connection reset".to_string())),
            None => Ok(response(200, &[], "{}")),
        }
    }
}

fn response(status: u16, headers: &[(&str, &str)], body: &str) -> TransportResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    TransportResponse {
        status,
        headers: map,
        body: Bytes::from(body.to_string()),
    }
}

fn ok(body: &str) -> Reply {
    Reply::Response(response(200, &[], body))
}

fn status(code: u16) -> Reply {
    Reply::Response(response(code, &[], ""))
}

fn dispatcher(replies: Vec<Reply>, max_retries: u32) -> Dispatcher<ScriptedTransport> {
    Dispatcher::new(ScriptedTransport::new(replies), max_retries)
}

// ============================================================================
// Status handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn success_returns_the_body() {
    let dispatcher = dispatcher(vec![ok(r#"{"id":"1"}"#)], 3);
    let body = dispatcher
        .request(&Request::get("/users/@me"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(body, Bytes::from_static(br#"{"id":"1"}"#));
    assert_eq!(dispatcher.transport().call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn other_success_codes_count_as_success() {
    let dispatcher = dispatcher(vec![status(204)], 3);
    let body = dispatcher
        .request(&Request::delete("/channels/1/messages/2"), &CancellationToken::new())
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limits_are_retried_without_using_retries() {
    let limited = || Reply::Response(response(429, &[("Retry-After", "500")], ""));
    // no retry budget at all, the 429s still get retried
    let dispatcher = dispatcher(vec![limited(), limited(), ok("done")], 0);
    let start = Instant::now();

    let body = dispatcher
        .request(&Request::get("/channels/5/messages"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(body, Bytes::from_static(b"done"));
    assert_eq!(dispatcher.transport().call_count(), 3);
    assert!(Instant::now() >= start + Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_headers_backs_off() {
    let dispatcher = dispatcher(vec![status(429), ok("done")], 0);
    dispatcher
        .request(&Request::get("/guilds/8/roles"), &CancellationToken::new())
        .await
        .unwrap();

    let times = dispatcher.transport().call_times();
    assert_eq!(times.len(), 2);
    assert!(times[1] >= times[0] + Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn bad_gateways_are_retried_up_to_the_limit() {
    let dispatcher = dispatcher((0..10).map(|_| status(502)).collect(), 3);
    let result = dispatcher
        .request(&Request::get("/gateway"), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(HttpError::RetriesExhausted { attempts: 4 })));
    assert_eq!(dispatcher.transport().call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn bad_gateway_then_success() {
    let dispatcher = dispatcher(vec![status(502), status(502), ok("fine")], 3);
    let body = dispatcher
        .request(&Request::get("/gateway"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(body, Bytes::from_static(b"fine"));
    assert_eq!(dispatcher.transport().call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn api_errors_are_decoded() {
    let dispatcher = dispatcher(
        vec![Reply::Response(response(
            404,
            &[],
            r#"{"code": 10003, "message": "Unknown Channel"}"#,
        ))],
        3,
    );
    let error = dispatcher
        .request(&Request::get("/channels/404"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(error.is_not_found());
    match error {
        HttpError::Api { status, error } => {
            assert_eq!(status, 404);
            assert_eq!(
                error,
                ApiError::Decoded {
                    code: 10003,
                    message: "Unknown Channel".to_string()
                }
            );
        }
        other => panic!("expected an api error, got {:?}", other),
    }
    assert_eq!(dispatcher.transport().call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_errors_free_the_bucket() {
    let dispatcher = dispatcher(vec![Reply::Fail, ok("second")], 3);
    let cancel = CancellationToken::new();
    let request = Request::get("/channels/7/messages");

    let result = dispatcher.request(&request, &cancel).await;
    assert!(matches!(result, Err(HttpError::Transport(_))));

    let start = Instant::now();
    let body = dispatcher.request(&request, &cancel).await.unwrap();
    assert_eq!(body, Bytes::from_static(b"second"));
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn global_rate_limit_with_stale_reset_backs_off() {
    let limited = || {
        Reply::Response(response(
            429,
            &[("X-RateLimit-Global", "true"), ("X-RateLimit-Reset", "1")],
            "",
        ))
    };
    let dispatcher = dispatcher(vec![limited(), limited(), limited(), ok("done")], 0);
    let start = Instant::now();

    let body = dispatcher
        .request(&Request::get("/channels/6/messages"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(body, Bytes::from_static(b"done"));

    let times = dispatcher.transport().call_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert!(pair[1] >= pair[0] + Duration::from_secs(1));
    }
    assert!(Instant::now() >= start + Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn route_rate_limit_with_past_reset_backs_off() {
    let dispatcher = dispatcher(
        vec![
            Reply::Response(response(429, &[("X-RateLimit-Remaining", "0"), ("X-RateLimit-Reset", "1")], "")),
            ok("done"),
        ],
        0,
    );
    dispatcher
        .request(&Request::get("/guilds/8/channels"), &CancellationToken::new())
        .await
        .unwrap();

    let times = dispatcher.transport().call_times();
    assert_eq!(times.len(), 2);
    assert!(times[1] >= times[0] + Duration::from_secs(1));
}

// ============================================================================
// Rate limiting across requests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn exhausted_bucket_delays_the_next_request() {
    let reset = SystemTime::now().duration_since(UNIX_EPOCH).unwrap() + Duration::from_secs(3);
    let reset = format!("{:.3}", reset.as_secs_f64());
    let dispatcher = dispatcher(
        vec![
            Reply::Response(response(
                200,
                &[("X-RateLimit-Remaining", "0"), ("X-RateLimit-Reset", reset.as_str())],
                "",
            )),
            ok(""),
        ],
        3,
    );
    let cancel = CancellationToken::new();
    let request = Request::post_json("/channels/1/messages", &serde_json::json!({"content": "hi"})).unwrap();

    dispatcher.request(&request, &cancel).await.unwrap();
    dispatcher.request(&request, &cancel).await.unwrap();

    let times = dispatcher.transport().call_times();
    assert!(times[1] >= times[0] + Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn global_limit_holds_back_every_bucket() {
    let dispatcher = Arc::new(dispatcher(
        vec![
            Reply::Response(response(
                429,
                &[("X-RateLimit-Global", "true"), ("Retry-After", "1500")],
                "",
            )),
            ok(""),
            ok(""),
        ],
        3,
    ));
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let first = {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.request(&Request::get("/channels/1"), &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(dispatcher.limiter().global().cooldown_until().is_some());

    // a completely different bucket has to wait the cooldown out as well
    dispatcher.request(&Request::get("/guilds/2"), &cancel).await.unwrap();
    first.await.unwrap().unwrap();

    let times = dispatcher.transport().call_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[0], start);
    assert!(times[1] >= start + Duration::from_millis(1500));
    assert!(times[2] >= start + Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn one_request_in_flight_per_bucket() {
    let transport = ScriptedTransport::new(Vec::new()).with_latency(Duration::from_millis(100));
    let dispatcher = Arc::new(Dispatcher::new(transport, 3));
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            dispatcher.request(&Request::get("/channels/1/messages"), &cancel).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(dispatcher.transport().call_count(), 5);
    assert_eq!(dispatcher.transport().max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn different_buckets_run_in_parallel() {
    let transport = ScriptedTransport::new(Vec::new()).with_latency(Duration::from_millis(100));
    let dispatcher = Arc::new(Dispatcher::new(transport, 3));
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for channel in 1..=3 {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let path = format!("/channels/{}/messages", channel);
            dispatcher.request(&Request::get(path), &cancel).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(dispatcher.limiter().bucket_count(), 3);
    assert_eq!(dispatcher.transport().max_in_flight.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Cancellation and helpers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cancelled_requests_never_go_out() {
    let dispatcher = dispatcher(vec![ok("")], 3);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = dispatcher.request(&Request::get("/users/@me"), &cancel).await;
    assert!(matches!(result, Err(HttpError::Cancelled)));
    assert_eq!(dispatcher.transport().call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_rate_limit_wait() {
    let dispatcher = Arc::new(dispatcher(
        vec![Reply::Response(response(429, &[("Retry-After", "60000")], ""))],
        3,
    ));
    let cancel = CancellationToken::new();

    let task = {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.request(&Request::get("/guilds/3/bans"), &cancel).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    assert!(matches!(task.await.unwrap(), Err(HttpError::Cancelled)));
    assert_eq!(dispatcher.transport().call_count(), 1);
}

#[derive(Deserialize)]
struct CurrentUser {
    id: String,
    username: String,
}

#[tokio::test(start_paused = true)]
async fn decodes_json_responses() {
    let dispatcher = dispatcher(vec![ok(r#"{"id": "42", "username": "gear"}"#), ok("not json")], 3);
    let cancel = CancellationToken::new();
    let bucket = BucketKey::new("/users/@me");

    let user: CurrentUser = dispatcher
        .execute_json(&bucket, &Request::get("/users/@me"), &cancel)
        .await
        .unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.username, "gear");

    let broken = dispatcher
        .execute_json::<CurrentUser>(&bucket, &Request::get("/users/@me"), &cancel)
        .await;
    assert!(matches!(broken, Err(HttpError::Deserialize(_))));
}
