//! Integration tests for the record-persist-replay cycle

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;

use mimeo::config::{RunnerConfig, SessionOptions};
use mimeo::intercept::{HookRegistrar, InterceptHook, LiveRequest, RawExchange, SyntheticResponse};
use mimeo::{SessionController, SessionOutcome, SessionState};

fn test_config(dir: &Path) -> RunnerConfig {
    RunnerConfig::new(dir.join("automocks"), dir.join("fixtures/automocks"))
}

fn request(method: &str, url: &str) -> LiveRequest {
    LiveRequest {
        method: method.to_string(),
        url: url.to_string(),
        body: None,
    }
}

fn exchange(method: &str, url: &str, content_type: &str, response: &str) -> RawExchange {
    RawExchange {
        method: method.to_string(),
        url: url.to_string(),
        request: Value::Null,
        response: response.to_string(),
        status: 200,
        status_text: "OK".to_string(),
        content_type: content_type.to_string(),
    }
}

/// Drive one live exchange through the hook the way a host adapter would:
/// intercept-start via `before_dispatch`, then the completion callback.
fn live_round_trip(controller: &mut SessionController, ex: RawExchange) {
    let req = request(&ex.method, &ex.url);
    let synthetic = controller.before_dispatch(&req);
    assert!(
        synthetic.is_none(),
        "recording sessions must not synthesize responses"
    );
    controller.on_complete(ex);
}

#[tokio::test]
async fn test_record_then_replay_round_trip() {
    mimeo::init_diagnostics(true);
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    // Phase 1: record two calls to the same endpoint plus one other
    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("checkout", 4, SessionOptions::default())
            .await
            .unwrap();
        assert!(controller.is_recording());

        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 1}"),
        );
        live_round_trip(
            &mut controller,
            exchange("GET", "/b", "application/json", "{\"other\": true}"),
        );
        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 2}"),
        );

        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    let manifest_path = temp_dir.path().join("automocks/checkout.json");
    assert!(manifest_path.exists(), "manifest persisted at session end");
    assert!(temp_dir
        .path()
        .join("fixtures/automocks/checkout/a.GET1.json")
        .exists());
    assert!(temp_dir
        .path()
        .join("fixtures/automocks/checkout/a.GET2.json")
        .exists());

    // The manifest itself never embeds response bodies
    let manifest_text = std::fs::read_to_string(&manifest_path).unwrap();
    assert!(!manifest_text.contains("\"v\": 1"));
    assert!(manifest_text.contains("\"count\""));

    // Phase 2: replay with the same version serves recorded bodies in order
    {
        let mut controller = SessionController::new(config);
        controller
            .begin_session("checkout", 4, SessionOptions::default())
            .await
            .unwrap();
        assert!(controller.is_replaying());

        let first = controller.before_dispatch(&request("GET", "/a")).unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.body, "{\"v\":1}");
        assert_eq!(first.content_type, "application/json");

        let other = controller.before_dispatch(&request("GET", "/b")).unwrap();
        assert_eq!(other.body, "{\"other\":true}");

        let second = controller.before_dispatch(&request("GET", "/a")).unwrap();
        assert_eq!(second.body, "{\"v\":2}");

        controller.end_session(SessionOutcome::Passed).await.unwrap();
        assert_eq!(controller.state(), SessionState::Idle);
    }
}

#[tokio::test]
async fn test_third_call_falls_through_to_last_recording() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("overcall", 1, SessionOptions::default())
            .await
            .unwrap();
        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 1}"),
        );
        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 2}"),
        );
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    let mut controller = SessionController::new(config);
    controller
        .begin_session("overcall", 1, SessionOptions::default())
        .await
        .unwrap();

    assert_eq!(
        controller.before_dispatch(&request("GET", "/a")).unwrap().body,
        "{\"v\":1}"
    );
    assert_eq!(
        controller.before_dispatch(&request("GET", "/a")).unwrap().body,
        "{\"v\":2}"
    );

    // Preserved fall-through: a third call repeats the last recording for
    // the key instead of going back to the network.
    assert_eq!(
        controller.before_dispatch(&request("GET", "/a")).unwrap().body,
        "{\"v\":2}"
    );

    // An endpoint that was never recorded does fall through
    assert!(controller.before_dispatch(&request("GET", "/never")).is_none());
}

#[tokio::test]
async fn test_text_response_round_trips_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("plain", 1, SessionOptions::default())
            .await
            .unwrap();
        live_round_trip(
            &mut controller,
            exchange("GET", "/motd", "text/plain", "{\"looks\": \"like json\"}"),
        );
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    // Raw text, not JSON-parsed, and not pretty-printed
    let fixture = std::fs::read_to_string(
        temp_dir.path().join("fixtures/automocks/plain/motd.GET1.txt"),
    )
    .unwrap();
    assert_eq!(fixture, "{\"looks\": \"like json\"}");

    let mut controller = SessionController::new(config);
    controller
        .begin_session("plain", 1, SessionOptions::default())
        .await
        .unwrap();

    let served = controller.before_dispatch(&request("GET", "/motd")).unwrap();
    assert_eq!(served.body, "{\"looks\": \"like json\"}");
    assert_eq!(served.content_type, "text/plain");
}

#[tokio::test]
async fn test_version_mismatch_forces_fresh_recording() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("versioned", 1, SessionOptions::default())
            .await
            .unwrap();
        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 1}"),
        );
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }
    let manifest_path = temp_dir.path().join("automocks/versioned.json");
    assert!(manifest_path.exists());

    // Requesting version 2 deletes the stale manifest and records anew
    let mut controller = SessionController::new(config);
    controller
        .begin_session("versioned", 2, SessionOptions::default())
        .await
        .unwrap();

    assert!(controller.is_recording());
    assert!(!manifest_path.exists(), "stale manifest deleted");
}

#[tokio::test]
async fn test_include_query_splits_keys_across_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let options = || SessionOptions {
        include_query: true,
        ..SessionOptions::default()
    };

    {
        let mut controller = SessionController::new(config.clone());
        controller.begin_session("query", 1, options()).await.unwrap();
        live_round_trip(
            &mut controller,
            exchange("GET", "/a?x=1", "application/json", "{\"x\": 1}"),
        );
        live_round_trip(
            &mut controller,
            exchange("GET", "/a?x=2", "application/json", "{\"x\": 2}"),
        );
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    let mut controller = SessionController::new(config);
    controller.begin_session("query", 1, options()).await.unwrap();

    // Order inverted relative to recording: keys are distinct, so each
    // query gets its own sequence.
    assert_eq!(
        controller.before_dispatch(&request("GET", "/a?x=2")).unwrap().body,
        "{\"x\":2}"
    );
    assert_eq!(
        controller.before_dispatch(&request("GET", "/a?x=1")).unwrap().body,
        "{\"x\":1}"
    );
}

#[tokio::test]
async fn test_resolver_override_post_processes_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("override", 1, SessionOptions::default())
            .await
            .unwrap();
        live_round_trip(
            &mut controller,
            exchange("GET", "/a", "application/json", "{\"v\": 1}"),
        );
        live_round_trip(
            &mut controller,
            exchange("GET", "/secret", "application/json", "{\"hidden\": true}"),
        );
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    // Override vetoes mocks for /secret and passes everything else through
    let veto_secret = mimeo::replay::resolver_fn(|req, _all, default| {
        if req.url.contains("secret") {
            None
        } else {
            default.cloned()
        }
    });
    let options = SessionOptions {
        resolver: Some(veto_secret),
        ..SessionOptions::default()
    };

    let mut controller = SessionController::new(config);
    controller.begin_session("override", 1, options).await.unwrap();

    assert!(controller.before_dispatch(&request("GET", "/a")).is_some());
    assert!(controller.before_dispatch(&request("GET", "/secret")).is_none());
}

#[tokio::test]
async fn test_pending_requests_drain_before_persist() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    let mut controller = SessionController::new(config);
    controller
        .begin_session("pending", 1, SessionOptions::default())
        .await
        .unwrap();

    // Two in-flight requests
    assert!(controller.before_dispatch(&request("GET", "/a")).is_none());
    assert!(controller.before_dispatch(&request("GET", "/b")).is_none());
    assert_eq!(controller.pending_tracker().in_flight(), 2);

    controller.on_complete(exchange("GET", "/a", "application/json", "{}"));
    controller.on_complete(exchange("GET", "/b", "application/json", "{}"));

    controller.wait_for_pending_requests().await;
    controller.end_session(SessionOutcome::Passed).await.unwrap();

    assert!(temp_dir.path().join("automocks/pending.json").exists());
}

#[tokio::test]
async fn test_recorded_request_bodies_survive_the_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    {
        let mut controller = SessionController::new(config.clone());
        controller
            .begin_session("bodies", 1, SessionOptions::default())
            .await
            .unwrap();
        let mut ex = exchange("POST", "/items", "application/json", "{\"id\": 9}");
        ex.request = json!({"name": "widget"});
        live_round_trip(&mut controller, ex);
        controller.end_session(SessionOutcome::Passed).await.unwrap();
    }

    let manifest_text =
        std::fs::read_to_string(temp_dir.path().join("automocks/bodies.json")).unwrap();
    let manifest: Value = serde_json::from_str(&manifest_text).unwrap();
    assert_eq!(
        manifest["recordings"][0]["request"],
        json!({"name": "widget"})
    );
    assert_eq!(manifest["recordings"][0]["method"], "POST");
}

struct TestRegistrar {
    hook: Option<Arc<Mutex<dyn InterceptHook + Send>>>,
}

impl HookRegistrar for TestRegistrar {
    fn install(&mut self, hook: Arc<Mutex<dyn InterceptHook + Send>>) {
        self.hook = Some(hook);
    }
}

#[tokio::test]
async fn test_installed_interceptor_drives_the_shared_controller() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    let controller = Arc::new(Mutex::new(SessionController::new(config)));
    controller
        .lock()
        .unwrap()
        .begin_session("shared", 1, SessionOptions::default())
        .await
        .unwrap();

    let mut registrar = TestRegistrar { hook: None };
    SessionController::install_interceptor(&controller, &mut registrar);
    let hook = registrar.hook.expect("hook installed");

    let synthetic: Option<SyntheticResponse> = hook
        .lock()
        .unwrap()
        .before_dispatch(&request("GET", "/a"));
    assert!(synthetic.is_none());
    hook.lock()
        .unwrap()
        .on_complete(exchange("GET", "/a", "application/json", "{\"v\": 1}"));

    controller
        .lock()
        .unwrap()
        .end_session(SessionOutcome::Passed)
        .await
        .unwrap();
    assert!(temp_dir.path().join("automocks/shared.json").exists());
}
