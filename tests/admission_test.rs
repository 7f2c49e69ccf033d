//! Integration tests for the admission gate under concurrent load

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use bytes::Bytes;
use hyper::{Request, Response, StatusCode};
use tokio_util::sync::CancellationToken;

use valve::config::ApiConfig;
use valve::sizing::FixedMemory;
use valve::{AdmissionGate, ConfigStore};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();
}

fn store_with(requests_max: usize, deadline_ms: u64) -> Arc<ConfigStore> {
    let store = Arc::new(ConfigStore::new());
    store.init(
        &ApiConfig {
            requests_max,
            requests_deadline_ms: deadline_ms,
            ..ApiConfig::default()
        },
        16,
        1,
        &FixedMemory(0),
    );
    store
}

fn request() -> Request<Full<Bytes>> {
    Request::builder()
        .method("PUT")
        .uri("/bucket/object")
        .body(Full::new(Bytes::from("payload")))
        .unwrap()
}

fn ok_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from("ok")))
        .unwrap()
}

#[tokio::test]
async fn concurrent_handlers_never_exceed_capacity() {
    init_tracing();

    let store = store_with(4, 5_000);
    let gate = AdmissionGate::new(store);

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let gate = gate.clone();
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);

        tasks.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            gate.admit(request(), &cancel, move |_req| async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                ok_response()
            })
            .await
        }));
    }

    for task in tasks {
        let outcome = task.await.unwrap();
        assert!(outcome.is_admitted());
    }

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_request_times_out_while_first_runs() {
    init_tracing();

    let store = store_with(1, 50);
    let gate = AdmissionGate::new(store);
    let invocations = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let gate = gate.clone();
        let invocations = Arc::clone(&invocations);

        tasks.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            gate.admit(request(), &cancel, move |_req| async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                ok_response()
            })
            .await
        }));
    }

    let mut admitted = 0;
    let mut timed_out = 0;
    for task in tasks {
        let outcome = task.await.unwrap();
        if outcome.is_admitted() {
            admitted += 1;
        } else if outcome.is_timed_out() {
            timed_out += 1;
            let response = outcome.into_response().unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(timed_out, 1);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_waiter_gets_no_response_and_no_handler_call() {
    init_tracing();

    let store = store_with(1, 500);
    let gate = AdmissionGate::new(Arc::clone(&store));

    // Occupy the only slot with a long-running handler.
    let holder = {
        let gate = gate.clone();
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            gate.admit(request(), &cancel, |_req| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                ok_response()
            })
            .await
        })
    };

    // Let the holder actually take the token.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        })
    };

    let invoked = Arc::new(AtomicUsize::new(0));
    let outcome = {
        let invoked = Arc::clone(&invoked);
        gate.admit(request(), &cancel, move |_req| async move {
            invoked.fetch_add(1, Ordering::SeqCst);
            ok_response()
        })
        .await
    };

    assert!(outcome.is_cancelled());
    assert!(outcome.into_response().is_none());
    assert_eq!(invoked.load(Ordering::SeqCst), 0);

    canceller.await.unwrap();
    assert!(holder.await.unwrap().is_admitted());
}

#[tokio::test]
async fn unlimited_mode_admits_everything_immediately() {
    init_tracing();

    // Never initialized: no pool, unlimited admission.
    let gate = AdmissionGate::new(Arc::new(ConfigStore::new()));
    let invocations = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let gate = gate.clone();
        let invocations = Arc::clone(&invocations);

        tasks.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            gate.admit(request(), &cancel, move |_req| async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                ok_response()
            })
            .await
        }));
    }

    for task in tasks {
        assert!(task.await.unwrap().is_admitted());
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn reconfiguration_grows_capacity_under_load() {
    init_tracing();

    let store = store_with(2, 100);
    let gate = AdmissionGate::new(Arc::clone(&store));

    // Fill both slots of the small pool.
    let mut holders = Vec::new();
    for _ in 0..2 {
        let gate = gate.clone();
        holders.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            gate.admit(request(), &cancel, |_req| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                ok_response()
            })
            .await
        }));
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Grow the pool while the old tokens are still held.
    store.init(
        &ApiConfig {
            requests_max: 8,
            requests_deadline_ms: 100,
            ..ApiConfig::default()
        },
        16,
        1,
        &FixedMemory(0),
    );

    // A new request is admitted from the fresh pool even though both old
    // tokens are still out.
    let cancel = CancellationToken::new();
    let outcome = gate
        .admit(request(), &cancel, |_req| async { ok_response() })
        .await;
    assert!(outcome.is_admitted());

    for holder in holders {
        assert!(holder.await.unwrap().is_admitted());
    }
}
