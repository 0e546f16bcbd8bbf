use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Goal {
    id: String,
    name: String,
    target: f64,
    progress: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardData {
    current_amount: f64,
    milestone_goals: Vec<Goal>,
    ticker_items: Vec<serde_json::Value>,
    saved_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecurringProgress {
    times_reached: u64,
    next_milestone: f64,
    in_interval: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerFrame {
    kind: String,
    item_id: Option<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_dir() -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("goal_ticker_http_{}_{}", std::process::id(), nanos));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/state")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let dir = unique_dir();
    let child = Command::new(env!("CARGO_BIN_EXE_goal_ticker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", dir.join("state.json"))
        .env("TICKER_FADE_MS", "50")
        .env("TICKER_CELEBRATION_MS", "300")
        .env("TICKER_POLL_MS", "200")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn get_state(client: &Client, base_url: &str) -> DashboardData {
    client
        .get(format!("{base_url}/api/state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_amount_add_and_sub_update_state() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_state(&client, &server.base_url).await;

    let after: DashboardData = client
        .post(format!("{}/api/amount", server.base_url))
        .json(&json!({ "action": "add", "amount": 12.5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after.current_amount, before.current_amount + 12.5);
    assert!(after.saved_at.is_some());

    let after_subs: DashboardData = client
        .post(format!("{}/api/subs", server.base_url))
        .json(&json!({ "count": 2, "multiplier": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after_subs.current_amount, after.current_amount + 10.0);

    let drained: DashboardData = client
        .post(format!("{}/api/amount", server.base_url))
        .json(&json!({ "action": "sub", "amount": 1_000_000.0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(drained.current_amount, 0.0);
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/amount", server.base_url))
        .json(&json!({ "action": "double", "amount": 5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/milestones", server.base_url))
        .json(&json!({ "name": "Zero", "target": 0.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/subs", server.base_url))
        .json(&json!({ "count": 1, "multiplier": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/api/milestones/does-not-exist", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_milestone_crossing_celebrates_on_ticker() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_state(&client, &server.base_url).await;
    let created: DashboardData = client
        .post(format!("{}/api/milestones", server.base_url))
        .json(&json!({ "name": "New keyboard", "target": 20.0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created.milestone_goals.len(), before.milestone_goals.len() + 1);
    let goal = created.milestone_goals.last().unwrap();
    assert_eq!(goal.name, "New keyboard");
    assert_eq!(goal.target, 20.0);
    assert_eq!(goal.progress, 0.0);
    let goal_id = goal.id.clone();

    client
        .post(format!("{}/api/amount", server.base_url))
        .json(&json!({ "action": "add", "amount": 25.0 }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let frame: TickerFrame = client
            .get(format!("{}/api/ticker/frame", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if frame.kind == "celebration" && frame.item_id.as_deref() == Some(goal_id.as_str()) {
            break;
        }
        if Instant::now() > deadline {
            panic!("celebration never shown, last frame {frame:?}");
        }
        sleep(Duration::from_millis(50)).await;
    }

    let removed: DashboardData = client
        .delete(format!("{}/api/milestones/{goal_id}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(removed.milestone_goals.iter().all(|goal| goal.id != goal_id));
}

#[tokio::test]
async fn http_recurring_progress_follows_amount() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .put(format!("{}/api/recurring", server.base_url))
        .json(&json!({ "interval": 50.0, "action": "sub" }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let state = get_state(&client, &server.base_url).await;
    let progress: RecurringProgress = client
        .get(format!("{}/api/recurring/progress", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let amount = state.current_amount;
    assert_eq!(progress.times_reached, (amount / 50.0).floor() as u64);
    assert_eq!(progress.next_milestone, (amount / 50.0).ceil() * 50.0);
    assert_eq!(progress.in_interval, amount % 50.0);

    client
        .delete(format!("{}/api/recurring", server.base_url))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
    let response = client
        .get(format!("{}/api/recurring/progress", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_ticker_items_add_and_remove() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_state(&client, &server.base_url).await;
    let added: DashboardData = client
        .post(format!("{}/api/ticker-items", server.base_url))
        .json(&json!({ "content": "Follow for more!" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(added.ticker_items.len(), before.ticker_items.len() + 1);
    let id = added.ticker_items.last().unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let removed: DashboardData = client
        .delete(format!("{}/api/ticker-items/{id}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.ticker_items.len(), before.ticker_items.len());
}

#[tokio::test]
async fn http_stub_endpoints() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/ticker", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body: serde_json::Value = client
        .post(format!("{}/api/ticker", server.base_url))
        .json(&json!({ "anything": [1, 2, 3] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "success": true }));

    let body: serde_json::Value = client
        .post(format!("{}/api/goals", server.base_url))
        .json(&json!({ "title": "Charity run", "completed": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "success": true }));

    let stored: serde_json::Value = client
        .get(format!("{}/api/goals", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored, json!({ "title": "Charity run", "completed": false }));
}
