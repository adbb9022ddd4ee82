mod common;

use common::FieldStub;
use reqwest::StatusCode;
use serde_json::{Value, json};
use shamba_console::{Config, Session, api};
use shamba_core::PlanTier;
use shamba_oracle::{OracleClient, ServiceFailure};
use tokio::net::TcpListener;

struct Harness {
    base: String,
    http: reqwest::Client,
    session: Session<FieldStub>,
}

impl Harness {
    async fn start(plan: PlanTier, backend: FieldStub) -> Self {
        let mut config = Config::default();
        config.session.plan = plan;
        config.telemetry.tick_interval_ms = 60_000;

        let session = Session::start(&config, OracleClient::new(backend));
        let app = api::router(session.handle());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
            session,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.http.get(format!("{}{path}", self.base)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post_image(&self, path: &str, mime: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .header("content-type", mime)
            .body(bytes)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn health_check() {
    let harness = Harness::start(PlanTier::Master, FieldStub::default()).await;

    let body = harness
        .http
        .get(format!("{}/health", harness.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");

    harness.session.end().await;
}

#[tokio::test]
async fn sensors_and_summary() {
    let harness = Harness::start(PlanTier::Master, FieldStub::default()).await;

    let (status, body) = harness.get("/api/sensors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["sensors"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["sensors"][0]["kind"], json!("soil-moisture"));

    let (status, body) = harness.get("/api/fleet/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["low_battery"], json!(["SN-A102"]));

    harness.session.end().await;
}

#[tokio::test]
async fn sensor_history_windows() {
    let harness = Harness::start(PlanTier::Master, FieldStub::default()).await;

    let (status, body) = harness.get("/api/sensors/SN-PH401/history?range=7d").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["range"], json!("7d"));
    assert_eq!(body["data"]["unit"], json!("pH"));
    assert_eq!(body["data"]["points"].as_array().unwrap().len(), 7);

    let (status, body) = harness.get("/api/sensors/SN-A101/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["points"].as_array().unwrap().len(), 24);

    let (status, body) = harness.get("/api/sensors/SN-Z999/history").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, _) = harness.get("/api/sensors/SN-A101/history?range=1y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    harness.session.end().await;
}

#[tokio::test]
async fn image_analysis() {
    let harness = Harness::start(PlanTier::Master, FieldStub::default()).await;

    let (status, body) = harness
        .post_image("/api/analyze/soil", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["diagnosis"], json!("Healthy loam, slightly acidic"));
    assert_eq!(body["data"]["sustainabilityImpact"], json!("Improves nutrient uptake"));

    let (status, body) = harness
        .post_image("/api/analyze/crop", "image/jpeg", Vec::new())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    harness.session.end().await;
}

#[tokio::test]
async fn strategic_report_respects_plan() {
    let harness = Harness::start(PlanTier::BoutiqueEstate, FieldStub::default()).await;
    let (status, _) = harness
        .post_json("/api/report", json!({ "context": "Maize yields" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    harness.session.end().await;

    let harness = Harness::start(PlanTier::IndustrialApex, FieldStub::default()).await;
    let (status, body) = harness
        .post_json("/api/report", json!({ "context": "Maize yields" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["report"], json!("Yields are on track for the season."));
    harness.session.end().await;
}

#[tokio::test]
async fn security_scan_by_source() {
    let harness = Harness::start(PlanTier::BoutiqueEstate, FieldStub::default()).await;

    let (status, body) = harness
        .post_json("/api/security/scan", json!({ "source": "archive" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], json!("archive"));
    assert_eq!(body["data"]["assessment"]["threatLevel"], json!("Elevated"));

    let (status, body) = harness.get("/api/threat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], json!("archive"));

    harness.session.end().await;
}

#[tokio::test]
async fn climate_refresh() {
    let harness = Harness::start(PlanTier::Master, FieldStub::default()).await;

    let (status, body) = harness.post_json("/api/climate/refresh", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["position"]["lat"], json!(-1.2863));
    assert_eq!(body["data"]["outlook"], json!("Long rains arrive two weeks early."));

    let (status, body) = harness.get("/api/climate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["position"]["lng"], json!(36.8172));

    harness.session.end().await;
}

#[tokio::test]
async fn service_failure_maps_to_bad_gateway() {
    let backend = FieldStub::failing(ServiceFailure::status(400, "API key not valid"));
    let harness = Harness::start(PlanTier::BoutiqueEstate, backend).await;

    let (status, body) = harness.post_json("/api/security/scan", json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("API key not valid"));

    harness.session.end().await;
}
