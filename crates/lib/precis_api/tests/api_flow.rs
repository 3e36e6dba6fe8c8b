//! End-to-end flow against a real PostgreSQL instance and a running server
//! with an in-process worker pool and a stub LLM.
//!
//! Skipped unless `DATABASE_URL` is set.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use precis_api::AppState;
use precis_core::auth::otp::{MailError, Mailer};
use precis_core::config::AppConfig;
use precis_core::dispatch::{self, HttpNotifier, new_task_id};
use precis_core::summarise::{LlmClient, SummariseError};

/// Captures OTPs instead of sending mail.
#[derive(Default)]
struct CaptureMailer {
    otps: Mutex<Vec<(String, String)>>,
}

impl CaptureMailer {
    fn last_otp_for(&self, email: &str) -> Option<String> {
        self.otps
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, otp)| otp.clone())
    }
}

impl Mailer for CaptureMailer {
    fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError> {
        self.otps
            .lock()
            .unwrap()
            .push((email.to_string(), otp.to_string()));
        Ok(())
    }
}

/// One fixed summary per page.
struct StubLlm;

impl LlmClient for StubLlm {
    async fn complete(
        &self,
        _credential: &str,
        _prompt: &str,
        _max_units: usize,
    ) -> Result<String, SummariseError> {
        Ok("S".to_string())
    }
}

struct TestServer {
    base: String,
    mailer: Arc<CaptureMailer>,
    client: reqwest::Client,
}

/// Start a full server (router + worker pool + HTTP notifier) on an
/// ephemeral port. Returns `None` when `DATABASE_URL` is not set.
async fn start_server(free_trial_units: i64) -> Option<TestServer> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .expect("connect to database");
    precis_api::migrate(&pool).await.expect("run migrations");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().unwrap();

    let config = AppConfig {
        bind_addr: addr.to_string(),
        database_url,
        jwt_secret: "api-flow-secret".into(),
        jwt_expiry_secs: 3600,
        otp_expiry_secs: 300,
        notify_key: "api-flow-notify-key".into(),
        notify_url: format!("http://{addr}/notify/task"),
        openai_api_key: "server-key".into(),
        openai_model: "stub".into(),
        openai_api_url: "http://127.0.0.1:0/unused".into(),
        page_size: 1000,
        free_trial_units,
        worker_count: 1,
    };

    let (dispatcher, rx) = dispatch::queue();
    dispatch::spawn_workers(
        1,
        rx,
        Arc::new(StubLlm),
        Arc::new(HttpNotifier::new(
            config.notify_url.clone(),
            config.notify_key.clone(),
        )),
        config.page_size,
    );

    let mailer = Arc::new(CaptureMailer::default());
    let state = AppState {
        pool,
        config,
        dispatcher,
        mailer: mailer.clone(),
    };
    let app = precis_api::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestServer {
        base: format!("http://{addr}"),
        mailer,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    /// Register, verify, and log in a fresh user; returns (email, token).
    async fn create_user(&self, password: &str) -> (String, String) {
        let email = format!("user-{}@example.com", new_task_id());

        let resp = self
            .client
            .post(format!("{}/user/register/password", self.base))
            .json(&serde_json::json!({
                "user_name": "Test User",
                "user_email": email,
                "user_password": password,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "OTP verification sent successfully!");
        assert!(body["expiry_in"].is_i64());

        let otp = self.mailer.last_otp_for(&email).expect("OTP captured");
        let resp = self
            .client
            .post(format!("{}/user/register/verify", self.base))
            .json(&serde_json::json!({ "user_email": email, "otp": otp }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let token = self.login(&email, password).await;
        (email, token)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(format!("{}/user/login/password", self.base))
            .json(&serde_json::json!({
                "user_email": email,
                "user_password": password,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["jwt_token"].as_str().unwrap().to_string()
    }

    async fn submit_text(&self, token: &str, filename: &str, text: &str) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(text.as_bytes().to_vec())
            .file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .post(format!("{}/generate_summary", self.base))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn get_summary(&self, token: &str, task_id: &str) -> serde_json::Value {
        let resp = self
            .client
            .get(format!("{}/user/get_summary", self.base))
            .query(&[("task_id", task_id)])
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    /// Poll until the task leaves PENDING.
    async fn await_terminal(&self, token: &str, task_id: &str) -> serde_json::Value {
        for _ in 0..100 {
            let body = self.get_summary(token, task_id).await;
            if body["status"] != "PENDING" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("task {task_id} never reached a terminal state");
    }
}

#[tokio::test]
async fn submit_poll_and_duplicate_notification_flow() {
    let Some(server) = start_server(10_000).await else {
        return;
    };
    let (_email, token) = server.create_user("securepassword").await;

    // Unsupported extension is rejected before anything is enqueued.
    let resp = server.submit_text(&token, "slides.pdf", "irrelevant").await;
    assert_eq!(resp.status(), 400);

    // 2500 characters at page size 1000: three pages, three stub summaries.
    let resp = server
        .submit_text(&token, "doc.txt", &"a".repeat(2500))
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let done = server.await_terminal(&token, &task_id).await;
    assert_eq!(done["status"], "SUCCESS");
    assert_eq!(done["result"], "S\nS\nS");

    // The worker already finalized the job; a duplicate FAILED notification
    // must be accepted and ignored.
    let resp = server
        .client
        .post(format!("{}/notify/task", server.base))
        .json(&serde_json::json!({
            "notification_auth": "api-flow-notify-key",
            "task_id": task_id,
            "task_status": "FAILED",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let after = server.get_summary(&token, &task_id).await;
    assert_eq!(after["status"], "SUCCESS");
    assert_eq!(after["result"], "S\nS\nS");

    // Unknown task with a valid key is a 404.
    let resp = server
        .client
        .post(format!("{}/notify/task", server.base))
        .json(&serde_json::json!({
            "notification_auth": "api-flow-notify-key",
            "task_id": "no-such-task",
            "task_status": "SUCCESS",
            "generated_summary": "s",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Listings: the completed task shows up, nothing is pending.
    let resp = server
        .client
        .get(format!("{}/user/completed_tasks", server.base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let completed = body["completed_tasks"].as_array().unwrap();
    assert!(completed.iter().any(|t| t["task_id"] == *task_id));

    // Another user cannot read the job.
    let (_intruder, other_token) = server.create_user("otherpassword").await;
    let resp = server
        .client
        .get(format!("{}/user/get_summary", server.base))
        .query(&[("task_id", task_id.as_str())])
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn quota_is_enforced_and_personal_key_bypasses_it() {
    let Some(server) = start_server(100).await else {
        return;
    };
    let (_email, token) = server.create_user("securepassword").await;

    // 2500 characters against a quota of 100: rejected, quota untouched.
    let resp = server
        .submit_text(&token, "big.txt", &"b".repeat(2500))
        .await;
    assert_eq!(resp.status(), 402);

    // An 80-character document still fits, proving the rejection did not
    // decrement anything.
    let resp = server
        .submit_text(&token, "small.txt", &"c".repeat(80))
        .await;
    assert_eq!(resp.status(), 200);

    // Only 20 units remain now.
    let resp = server
        .submit_text(&token, "small2.txt", &"d".repeat(80))
        .await;
    assert_eq!(resp.status(), 402);

    // A personal key lifts the quota entirely.
    let resp = server
        .client
        .post(format!("{}/user/update_key", server.base))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "openai_api_key": "personal-key" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .submit_text(&token, "big2.txt", &"e".repeat(2500))
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn password_reset_revokes_earlier_tokens() {
    let Some(server) = start_server(10_000).await else {
        return;
    };
    let (email, old_token) = server.create_user("originalpassword").await;

    // The old token works before the reset.
    let resp = server
        .client
        .get(format!("{}/user/tasks", server.base))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .post(format!("{}/user/auth/forgot_password", server.base))
        .json(&serde_json::json!({ "user_email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let otp = server.mailer.last_otp_for(&email).unwrap();

    // Claim timestamps have second granularity; make sure the reset lands in
    // a strictly later second than the old token's issuance.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let resp = server
        .client
        .post(format!("{}/user/auth/reset_password", server.base))
        .json(&serde_json::json!({
            "user_email": email,
            "user_otp": otp,
            "user_new_password": "replacementpassword",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let fresh_token = body["jwt_token"].as_str().unwrap();

    // Pre-reset token: revoked. Token returned by the reset: valid.
    let resp = server
        .client
        .get(format!("{}/user/tasks", server.base))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .get(format!("{}/user/tasks", server.base))
        .bearer_auth(fresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Old password no longer logs in; the new one does.
    let resp = server
        .client
        .post(format!("{}/user/login/password", server.base))
        .json(&serde_json::json!({
            "user_email": email,
            "user_password": "originalpassword",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    server.login(&email, "replacementpassword").await;

    // Refresh with the fresh token issues another working token.
    let resp = server
        .client
        .post(format!("{}/user/auth/refresh_token", server.base))
        .bearer_auth(fresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["refresh_token"].is_string());
}

#[tokio::test]
async fn duplicate_registration_and_resend_otp() {
    let Some(server) = start_server(10_000).await else {
        return;
    };
    let (email, _token) = server.create_user("securepassword").await;

    // Re-registering a verified account is rejected.
    let resp = server
        .client
        .post(format!("{}/user/register/password", server.base))
        .json(&serde_json::json!({
            "user_name": "Test User",
            "user_email": email,
            "user_password": "securepassword",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Resend for a still-pending registration rotates the OTP.
    let pending = format!("pending-{}@example.com", new_task_id());
    let resp = server
        .client
        .post(format!("{}/user/register/password", server.base))
        .json(&serde_json::json!({
            "user_name": "Pending User",
            "user_email": pending,
            "user_password": "securepassword",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .post(format!("{}/user/register/resend_otp", server.base))
        .json(&serde_json::json!({ "user_email": pending }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The rotated OTP still verifies.
    let otp = server.mailer.last_otp_for(&pending).unwrap();
    let resp = server
        .client
        .post(format!("{}/user/register/verify", server.base))
        .json(&serde_json::json!({ "user_email": pending, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Resend for an unknown email is a 404.
    let resp = server
        .client
        .post(format!("{}/user/register/resend_otp", server.base))
        .json(&serde_json::json!({ "user_email": "ghost@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Wrong OTP on a pending registration is a 401.
    let pending2 = format!("pending2-{}@example.com", new_task_id());
    server
        .client
        .post(format!("{}/user/register/password", server.base))
        .json(&serde_json::json!({
            "user_name": "Pending User",
            "user_email": pending2,
            "user_password": "securepassword",
        }))
        .send()
        .await
        .unwrap();
    let resp = server
        .client
        .post(format!("{}/user/register/verify", server.base))
        .json(&serde_json::json!({ "user_email": pending2, "otp": "000000x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
