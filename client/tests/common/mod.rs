//! Stub of the VRage Remote API serving fixed fixtures.

#![allow(dead_code)]

use axum::{
    extract::{
        Path,
        State,
    },
    http::{
        header::{
            AUTHORIZATION,
            DATE,
        },
        HeaderMap,
        HeaderName,
        StatusCode,
    },
    response::{
        Html,
        IntoResponse,
        Response,
    },
    routing::get,
    Json,
    Router,
};
use se_exporter_client::{
    CollectMode,
    CollectorOptions,
    Credentials,
    MetricRecord,
    MetricsCollector,
    RequestSigner,
    ResourceFetcher,
    BASE_PATH,
};
use serde_json::{
    json,
    Value,
};
use std::{
    collections::HashSet,
    net::SocketAddr,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
        Mutex,
    },
};

pub const TOKEN: &str = "c2UtZXhwb3J0ZXItdGVzdC1rZXk=";

pub struct Stub {
    signer: RequestSigner,
    nonces: Mutex<HashSet<u64>>,
    failing: Vec<String>,
    html: Vec<String>,
}

impl Stub {
    pub fn new() -> Self {
        let creds = Credentials::new("localhost", None, Some(TOKEN)).unwrap();
        Self {
            signer: RequestSigner::with_seed(&creds, 0).unwrap(),
            nonces: Default::default(),
            failing: Vec::new(),
            html: Vec::new(),
        }
    }

    /// Answer `resource` with a 500.
    pub fn failing(mut self, resource: &str) -> Self {
        self.failing.push(resource.to_string());
        self
    }

    /// Answer `resource` with an HTML page instead of JSON.
    pub fn html(mut self, resource: &str) -> Self {
        self.html.push(resource.to_string());
        self
    }

    fn verify(&self, full_path: &str, headers: &HeaderMap) -> bool {
        let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        let (Some(date), Some(auth)) = (header(DATE), header(AUTHORIZATION)) else {
            return false;
        };
        let Some((nonce, signature)) = auth.split_once(':') else {
            return false;
        };
        let Ok(nonce) = nonce.parse::<u64>() else {
            return false;
        };

        let expected = self.signer.sign_with(full_path, nonce, date.to_string());
        expected.signature == signature && self.nonces.lock().unwrap().insert(nonce)
    }

    pub fn seen_nonces(&self) -> usize {
        self.nonces.lock().unwrap().len()
    }
}

pub async fn spawn(stub: Stub) -> (SocketAddr, Arc<Stub>) {
    let stub = Arc::new(stub);
    let app = Router::new()
        .route("/vrageremote/v1/{*path}", get(handle))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, stub)
}

async fn handle(State(stub): State<Arc<Stub>>, Path(path): Path<String>, headers: HeaderMap) -> Response {
    let full_path = format!("{BASE_PATH}/{path}");
    if !stub.verify(&full_path, &headers) {
        return (StatusCode::UNAUTHORIZED, "invalid signature or nonce").into_response();
    }
    if stub.failing.contains(&path) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if stub.html.contains(&path) {
        return Html("<html><body>502 Bad Gateway</body></html>").into_response();
    }
    match fixture(&path) {
        Some(data) => Json(json!({ "data": data, "meta": { "apiVersion": "1.0" } })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn fixture(resource: &str) -> Option<Value> {
    let data = match resource {
        "server" => json!({
            "Game": "SE",
            "IsReady": true,
            "PirateUsedPCU": 120,
            "Players": 2,
            "ServerId": 7,
            "ServerName": "Alpha Station",
            "SimSpeed": 0.98,
            "SimulationCpuLoad": 41.5,
            "TotalTime": 3600,
            "UsedPCU": 5000,
            "Version": "1.203.505",
            "WorldName": "Star System",
        }),
        "session/players" => json!({ "Players": [
            { "SteamID": 76561198000000001u64, "DisplayName": "Ada", "FactionName": "Spirit", "FactionTag": "SPRT", "PromoteLevel": 0, "Ping": 45 },
            { "SteamID": 76561198000000002u64, "DisplayName": "Bob", "FactionName": null, "FactionTag": null, "PromoteLevel": 0, "Ping": 0 },
        ]}),
        "session/planets" => json!({ "Planets": [
            { "DisplayName": "Earthlike", "EntityId": 101, "Position": { "X": 0.0, "Y": 0.0, "Z": 0.0 } },
            { "DisplayName": "Moon", "EntityId": 102, "Position": { "X": 16384.0, "Y": 136384.0, "Z": -113615.0 } },
        ]}),
        "session/characters" => json!({ "Characters": [
            { "DisplayName": "Ada", "EntityId": 201, "Mass": 100.0, "LinearSpeed": 0.0 },
        ]}),
        "session/grids" => json!({ "Grids": [
            { "DisplayName": "Base", "EntityId": 301, "GridSize": "Large", "BlocksCount": 420, "IsPowered": true },
            { "DisplayName": "Miner", "EntityId": 302, "GridSize": "Small", "BlocksCount": 85, "IsPowered": true },
            { "DisplayName": "Wreck", "EntityId": 303, "GridSize": "Small", "BlocksCount": 12, "IsPowered": false },
        ]}),
        "session/asteroids" => json!({ "Asteroids": [] }),
        "session/floatingObjects" => json!({ "FloatingObjects": [
            { "DisplayName": "Iron Ore", "EntityId": 401, "Kind": "FloatingObject" },
            { "DisplayName": "Stone", "EntityId": 402, "Kind": "FloatingObject" },
        ]}),
        "admin/bannedPlayers" => json!({ "BannedPlayers": [] }),
        "admin/kickedPlayers" => json!({ "KickedPlayers": [
            { "SteamId": 76561198000000003u64, "Name": "Griefer", "Time": 300 },
        ]}),
        _ => return None,
    };
    Some(data)
}

/// Each collector gets its own nonce range so collectors sharing one stub never collide.
static NEXT_SEED: AtomicU64 = AtomicU64::new(1_000_000);

pub fn collector(addr: SocketAddr, token: &str, mode: CollectMode) -> MetricsCollector {
    let creds = Credentials::new(addr.ip().to_string(), Some(addr.port()), Some(token)).unwrap();
    let signer = RequestSigner::with_seed(&creds, NEXT_SEED.fetch_add(1_000_000, Ordering::SeqCst)).unwrap();
    let options = CollectorOptions {
        mode,
        ..Default::default()
    };
    MetricsCollector::with_fetcher(ResourceFetcher::with_signer(creds, signer).unwrap(), options)
}

/// Records rendered and sorted, for order independent comparisons.
pub fn rendered(records: &[MetricRecord]) -> Vec<String> {
    let mut lines: Vec<_> = records.iter().map(ToString::to_string).collect();
    lines.sort();
    lines
}
