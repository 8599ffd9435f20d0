use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use once_cell::sync::Lazy;
use reqwest::{redirect, Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistResponse {
    completed_count: usize,
    total_count: usize,
    progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    date: String,
    completed_count: u32,
    total_count: u32,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayPoint {
    date: String,
    percentage: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    last_7_days: Vec<DayPoint>,
}

#[derive(Debug, Deserialize)]
struct ShareLink {
    url: String,
    token: String,
    method: String,
}

#[derive(Debug, Deserialize)]
struct ShareReport {
    notice: Option<String>,
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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "care_checklist_http_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/checklist")).send().await {
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
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_care_checklist"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_PUBLIC_URL", format!("http://127.0.0.1:{port}"))
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

async fn history(client: &Client, server: &TestServer) -> Vec<Entry> {
    let response: HistoryResponse = client
        .get(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response.history
}

async fn reset(client: &Client, server: &TestServer) -> ChecklistResponse {
    client
        .post(format!("{}/api/checklist/reset", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

fn no_redirect_client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn http_toggle_updates_progress() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let cleared = reset(&client, &server).await;
    assert_eq!(cleared.completed_count, 0);

    for id in ["pill", "mood"] {
        let response = client
            .post(format!("{}/api/checklist/{id}/toggle", server.base_url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let checklist: ChecklistResponse = client
        .get(format!("{}/api/checklist", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(checklist.completed_count, 2);
    assert_eq!(checklist.total_count, 5);
    assert_eq!(checklist.progress_percent, 40.0);

    reset(&client, &server).await;
}

#[tokio::test]
async fn http_unknown_item_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/checklist/nope/toggle", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_save_day_records_history_and_resets() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    reset(&client, &server).await;
    client
        .post(format!("{}/api/checklist/pill/toggle", server.base_url))
        .send()
        .await
        .unwrap();

    let saved: HistoryResponse = client
        .post(format!("{}/api/day/save", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(saved.history.len() <= 7);

    let stats: StatsResponse = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.last_7_days.len(), 7);
    let today = stats.last_7_days.last().unwrap();
    assert_eq!(today.percentage, 20);

    let entry = saved
        .history
        .iter()
        .find(|entry| entry.date == today.date)
        .expect("today's entry");
    assert_eq!(entry.completed_count, 1);
    assert_eq!(entry.total_count, 5);

    let checklist: ChecklistResponse = client
        .get(format!("{}/api/checklist", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(checklist.completed_count, 0);

    let count_before = history(&client, &server).await.len();
    client
        .post(format!("{}/api/day/save", server.base_url))
        .send()
        .await
        .unwrap();
    let after = history(&client, &server).await;
    assert_eq!(after.len(), count_before);
    let entry = after.iter().find(|entry| entry.date == today.date).unwrap();
    assert_eq!(entry.completed_count, 0);
}

#[tokio::test]
async fn http_share_link_replaces_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let shared = vec![
        Entry {
            date: "01.01.2024".to_string(),
            completed_count: 3,
            total_count: 5,
        },
        Entry {
            date: "02.01.2024".to_string(),
            completed_count: 5,
            total_count: 5,
        },
    ];
    let payload = serde_json::json!([
        { "date": "01.01.2024", "completedCount": 3, "totalCount": 5 },
        { "date": "02.01.2024", "completedCount": 5, "totalCount": 5 }
    ]);
    let token = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());

    let response = no_redirect_client()
        .get(format!("{}/?share={token}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/?notice=share-loaded"
    );
    assert_eq!(history(&client, &server).await, shared);

    let link: ShareLink = client
        .get(format!("{}/api/share", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(link.url, format!("{}/?share={}", server.base_url, link.token));
    assert_eq!(link.method, "clipboard");

    let native: ShareLink = client
        .get(format!("{}/api/share?native=true", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(native.method, "native");
    assert_eq!(native.token, link.token);

    let imported: HistoryResponse = client
        .post(format!("{}/api/share/import", server.base_url))
        .json(&serde_json::json!({ "token": link.token }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(imported.history, shared);
}

#[tokio::test]
async fn http_invalid_share_leaves_history_untouched() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = history(&client, &server).await;

    let response = client
        .post(format!("{}/api/share/import", server.base_url))
        .json(&serde_json::json!({ "token": "!!not-base64!!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let not_json = URL_SAFE_NO_PAD.encode(b"definitely not json");
    let response = no_redirect_client()
        .get(format!("{}/?share={not_json}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/?notice=share-invalid"
    );

    assert_eq!(history(&client, &server).await, before);

    let page = client
        .get(format!("{}/?notice=share-invalid", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"data-type="error""#));
}

#[tokio::test]
async fn http_export_downloads_pdf() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/export.pdf", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"care-checklist-"));
    assert!(disposition.ends_with(".pdf\""));

    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn http_share_report_classifies_failures() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let cancelled: ShareReport = client
        .post(format!("{}/api/share/report", server.base_url))
        .json(&serde_json::json!({ "method": "native", "name": "AbortError", "message": "Share canceled" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cancelled.notice.is_none());

    let failed: ShareReport = client
        .post(format!("{}/api/share/report", server.base_url))
        .json(&serde_json::json!({ "method": "clipboard", "name": "NotAllowedError" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(failed.notice.is_some());
}
