use once_cell::sync::Lazy;
use reqwest::multipart::{Form, Part};
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
struct ShiftCard {
    name: String,
    time: String,
    checked: String,
    delidosu_url: String,
    anecan_url: String,
    registered: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShiftBoard {
    date: Option<String>,
    cards: Vec<ShiftCard>,
    checked: usize,
    unmatched: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    name: String,
    delidosu_name: String,
    delidosu_url: String,
    anecan_name: String,
    anecan_url: String,
    class: String,
    main_store: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    success: bool,
    error: String,
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
    path.push(format!("shift_board_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/shifts")).send().await {
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
    let child = Command::new(env!("CARGO_BIN_EXE_shift_board"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env_remove("SHIFT_BOARD_API_URL")
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

async fn fetch_board(client: &Client, base_url: &str) -> ShiftBoard {
    client
        .get(format!("{base_url}/api/shifts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn fetch_directory(client: &Client, base_url: &str) -> Vec<Entry> {
    client
        .get(format!("{base_url}/api/directory"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_added_entry_reads_back_intact() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/directory", server.base_url))
        .json(&json!({
            "name": "ひなた",
            "delidosuName": "ひなたD",
            "delidosuUrl": "https://d.example/hinata",
            "anecanName": "ひなたA",
            "anecanUrl": "https://a.example/hinata",
            "class": "VIP",
            "mainStore": "anecan"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let directory = fetch_directory(&client, &server.base_url).await;
    let entry = directory
        .iter()
        .find(|entry| entry.name == "ひなた")
        .expect("missing entry");
    assert_eq!(entry.delidosu_name, "ひなたD");
    assert_eq!(entry.delidosu_url, "https://d.example/hinata");
    assert_eq!(entry.anecan_name, "ひなたA");
    assert_eq!(entry.anecan_url, "https://a.example/hinata");
    assert_eq!(entry.class, "VIP");
    assert_eq!(entry.main_store, "anecan");
}

#[tokio::test]
async fn http_duplicate_entry_is_rejected_with_server_text() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let entry = json!({ "name": "つばさ", "delidosuUrl": "https://d.example/tsubasa" });
    let first = client
        .post(format!("{}/api/directory", server.base_url))
        .json(&entry)
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/api/directory", server.base_url))
        .json(&entry)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = second.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.error, "つばさは既に登録されています");
}

#[tokio::test]
async fn http_roster_rows_are_sorted_and_reconciled() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/directory", server.base_url))
        .json(&json!({ "name": "佐藤", "anecanUrl": "https://a.example/sato" }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/shifts", server.base_url))
        .json(&json!({
            "fileName": "出勤表_20261018.xlsx",
            "rows": [
                { "源氏名": "田中", "シフト状態": "出勤予", "出勤時間": "10:00" },
                { "源氏名": "鈴木", "シフト状態": "出勤予", "出勤時間": 0.3854166666666667 },
                { "源氏名": "山田", "シフト状態": "休み" },
                { "源氏名": "佐藤", "シフト状態": "出勤予", "出勤時間": "09:15" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let board = fetch_board(&client, &server.base_url).await;
    let order: Vec<(&str, &str)> = board
        .cards
        .iter()
        .map(|card| (card.name.as_str(), card.time.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("佐藤", "09:15"), ("鈴木", "09:15"), ("田中", "10:00")]
    );
    assert_eq!(board.date.as_deref(), Some("2026-10-18"));

    let sato = &board.cards[0];
    assert!(sato.registered);
    assert_eq!(sato.anecan_url, "https://a.example/sato");
    assert_eq!(sato.delidosu_url, "");

    let tanaka = &board.cards[2];
    assert!(!tanaka.registered);
    assert_eq!(tanaka.delidosu_url, "");
    assert_eq!(tanaka.anecan_url, "");
    assert!(board.unmatched.contains(&"田中".to_string()));
}

#[tokio::test]
async fn http_roster_without_scheduled_rows_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/shifts", server.base_url))
        .json(&json!({
            "rows": [{ "源氏名": "山田", "シフト状態": "休み" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("出勤予"));
}

#[tokio::test]
async fn http_check_toggle_marks_shift() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/shifts", server.base_url))
        .json(&json!({
            "rows": [{ "源氏名": "こはる", "シフト状態": "出勤予", "出勤時間": "12:00" }]
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/shifts/check", server.base_url))
        .json(&json!({ "name": "こはる", "checked": true }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let board = fetch_board(&client, &server.base_url).await;
    assert_eq!(board.checked, 1);
    assert_eq!(board.cards[0].checked, "済");
}

#[tokio::test]
async fn http_spreadsheet_upload_lands_on_board() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let csv = "源氏名,シフト状態,出勤時間,でりどす\nみなみ,出勤予,18:30,みなみD\nあおい,欠勤,,\n";
    let form = Form::new().part(
        "file",
        Part::bytes(csv.as_bytes().to_vec()).file_name("shift_20261019.csv"),
    );
    let response = client
        .post(format!("{}/upload", server.base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();
    assert!(html.contains("Excelファイルをアップロードしました"));
    assert!(html.contains("📅 2026年10月19日のシフト"));
    assert!(html.contains("みなみ"));
    assert!(!html.contains("あおい"));

    let board = fetch_board(&client, &server.base_url).await;
    assert_eq!(board.cards.len(), 1);
    assert_eq!(board.cards[0].time, "18:30");
}

#[tokio::test]
async fn http_shift_page_renders_identically_twice() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let first = client.get(&server.base_url).send().await.unwrap().text().await.unwrap();
    let second = client.get(&server.base_url).send().await.unwrap().text().await.unwrap();
    assert_eq!(first, second);
}
