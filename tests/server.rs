//! HTTP API tests against an in-process server on a free port.

use ragdesk::config::Config;
use ragdesk::server;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start a server with default config and return its base URL.
async fn start_server() -> String {
    start_server_with(Config::default()).await
}

async fn start_server_with(config: Config) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server::serve(listener, &config).await.unwrap();
    });
    let base = format!("http://{}", addr);
    wait_for_server(&base).await;
    base
}

async fn wait_for_server(base: &str) {
    let url = format!("{}/health", base);
    for _ in 0..50 {
        if let Ok(resp) = reqwest::get(&url).await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn upload(client: &reqwest::Client, base: &str, filename: &str, body: &[u8]) -> Value {
    let resp = client
        .post(format!("{}/documents", base))
        .query(&[("filename", filename)])
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

async fn ask(client: &reqwest::Client, base: &str, query: &str) -> Value {
    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "query": query }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_health() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ask_before_upload() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let body = ask(&client, &base, "anything").await;
    assert_eq!(
        body["answer"],
        "There is nothing to search yet. Upload a document first."
    );
    assert_eq!(body["passages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_then_ask() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let body = upload(
        &client,
        &base,
        "pets.txt",
        b"The cat sat on the mat.\nThe dog ran in the park.",
    )
    .await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["documents"], 1);
    assert_eq!(body["chunks"], 1);

    let body = ask(&client, &base, "cat").await;
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("Question: cat"));
    assert!(answer.contains("The cat sat on the mat."));

    let passages = body["passages"].as_array().unwrap();
    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0]["index"], 0);
    assert!(passages[0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_blank_upload_not_accepted() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let body = upload(&client, &base, "blank.txt", b"  \n\t ").await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["documents"], 0);
    assert_eq!(body["chunks"], 0);
}

#[tokio::test]
async fn test_cp949_upload() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    // "안녕 세계" in CP949
    let bytes = [0xBE, 0xC8, 0xB3, 0xE7, b' ', 0xBC, 0xBC, 0xB0, 0xE8];
    let body = upload(&client, &base, "hello.txt", &bytes).await;
    assert_eq!(body["accepted"], true);

    let body = ask(&client, &base, "안녕").await;
    assert!(body["answer"].as_str().unwrap().contains("안녕 세계"));
}

#[tokio::test]
async fn test_upload_requires_filename() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/documents", base))
        .body("some text")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_status_and_reset() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    upload(&client, &base, "apples.txt", b"apples are red").await;
    upload(&client, &base, "bananas.txt", b"bananas are yellow").await;

    let status: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["documents"], 2);
    assert_eq!(status["strategy"], "tfidf");
    let files = status["files"].as_array().unwrap();
    assert_eq!(files[0]["filename"], "apples.txt");
    assert_eq!(files[1]["filename"], "bananas.txt");
    assert_eq!(files[0]["chars"], 14);
    assert!(files[0]["added_at"].is_string());

    let reset: Value = client
        .post(format!("{}/reset", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset["documents"], 0);
    assert_eq!(reset["chunks"], 0);

    let body = ask(&client, &base, "apple").await;
    assert_eq!(
        body["answer"],
        "There is nothing to search yet. Upload a document first."
    );
}

#[tokio::test]
async fn test_apple_query_ranks_apples_first() {
    let mut config = Config::default();
    config.chunking.chunk_size = 20;
    config.chunking.chunk_overlap = 5;
    config.index.analyzer = "char_wb".to_string();
    let base = start_server_with(config).await;
    let client = reqwest::Client::new();

    upload(&client, &base, "apples.txt", b"apples are red").await;
    upload(&client, &base, "bananas.txt", b"bananas are yellow").await;

    let body = ask(&client, &base, "apple").await;
    let passages = body["passages"].as_array().unwrap();
    assert_eq!(passages[0]["text"], "apples are red");
    assert_eq!(passages[1]["text"], "bananas are yellow");
    assert!(passages[0]["score"].as_f64().unwrap() > passages[1]["score"].as_f64().unwrap());
}
