//! HTTP server for Rule 30 automaton output.
//!
//! `GET /api/v1/random` answers in the ANU QRNG JSON shape so existing
//! clients can point at it. `POST /api/v1/entropy` is the HTTP form of a
//! device write: the request body is mixed into the pool.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use eca30_core::{Device, Error};

/// Largest `length` accepted by `/api/v1/random`.
const MAX_LENGTH: usize = 65536;

/// Shared server state.
struct AppState {
    device: Device,
}

#[derive(Deserialize)]
struct RandomParams {
    length: Option<usize>,
    #[serde(rename = "type")]
    data_type: Option<String>,
}

#[derive(Serialize)]
struct RandomResponse {
    #[serde(rename = "type")]
    data_type: String,
    length: usize,
    data: serde_json::Value,
    success: bool,
    /// Error message if request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct EntropyResponse {
    success: bool,
    /// Bytes mixed into the pool.
    consumed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    live_cells: u32,
    reseeds: u64,
    bytes_out: u64,
    bytes_in: u64,
}

fn encode(raw: &[u8], data_type: &str) -> serde_json::Value {
    match data_type {
        "hex16" => serde_json::Value::Array(
            raw.chunks_exact(2)
                .map(|c| serde_json::Value::String(format!("{:02x}{:02x}", c[0], c[1])))
                .collect(),
        ),
        "uint8" => {
            serde_json::Value::Array(raw.iter().map(|&b| serde_json::Value::from(b)).collect())
        }
        "uint16" => serde_json::Value::Array(
            raw.chunks_exact(2)
                .map(|c| serde_json::Value::from(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
        ),
        _ => serde_json::Value::String(hex::encode(raw)),
    }
}

fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::ReadOnly => StatusCode::FORBIDDEN,
        Error::EntropyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run a device operation on the blocking pool. Generation and a reseed
/// that waits on the OS must not stall the async workers.
async fn on_device<T, F>(state: &Arc<AppState>, op: F) -> Result<T, (StatusCode, String)>
where
    T: Send + 'static,
    F: FnOnce(&Device) -> eca30_core::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    match tokio::task::spawn_blocking(move || op(&state.device)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err((error_status(&e), e.to_string())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn handle_random(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RandomParams>,
) -> (StatusCode, Json<RandomResponse>) {
    let length = params.length.unwrap_or(1024).clamp(1, MAX_LENGTH);
    let data_type = params.data_type.unwrap_or_else(|| "hex16".to_string());

    let raw = match on_device(&state, move |device| device.read(length)).await {
        Ok(raw) => raw,
        Err((status, message)) => {
            log::warn!("random request for {length} bytes failed: {message}");
            return Json(RandomResponse {
                data_type,
                length: 0,
                data: serde_json::Value::Array(vec![]),
                success: false,
                error: Some(message),
            })
            .with_status(status);
        }
    };

    let data = encode(&raw, &data_type);
    let len = match &data {
        serde_json::Value::Array(a) => a.len(),
        _ => length,
    };

    (
        StatusCode::OK,
        Json(RandomResponse {
            data_type,
            length: len,
            data,
            success: true,
            error: None,
        }),
    )
}

async fn handle_entropy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<EntropyResponse>) {
    match on_device(&state, move |device| device.write(&body)).await {
        Ok(consumed) => {
            log::debug!("injected {consumed} bytes over http");
            (
                StatusCode::OK,
                Json(EntropyResponse {
                    success: true,
                    consumed,
                    error: None,
                }),
            )
        }
        Err((status, message)) => Json(EntropyResponse {
            success: false,
            consumed: 0,
            error: Some(message),
        })
        .with_status(status),
    }
}

trait JsonWithStatus<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>);
}

impl<T> JsonWithStatus<T> for Json<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>) {
        (status, self)
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.device.status();
    Json(HealthResponse {
        status: if status.nonzero {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        live_cells: status.live_cells,
        reseeds: status.stats.reseeds,
        bytes_out: status.stats.bytes_out,
        bytes_in: status.stats.bytes_in,
    })
}

async fn handle_pool_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.device.status()).unwrap_or_default())
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let writable = state.device.is_writable();
    let entropy_description = if writable {
        "Mix the raw request body into the pool"
    } else {
        "Disabled: server is read-only"
    };

    Json(serde_json::json!({
        "name": "eca30 server",
        "version": eca30_core::VERSION,
        "width_bits": eca30_core::POOL_BITS,
        "writable": writable,
        "endpoints": {
            "/": "This API index",
            "/api/v1/random": {
                "method": "GET",
                "description": "Get bytes from the Rule 30 automaton",
                "params": {
                    "length": format!("Number of bytes (1-{MAX_LENGTH}, default: 1024)"),
                    "type": "Output format: hex16, uint8, uint16, hex (default: hex16)",
                }
            },
            "/api/v1/entropy": {
                "method": "POST",
                "description": entropy_description,
            },
            "/pool/status": "Engine counters and settings",
            "/health": "Health check",
        },
        "examples": {
            "bytes": "/api/v1/random?length=32&type=uint8",
            "hex_string": "/api/v1/random?length=32&type=hex",
        }
    }))
}

/// Build the axum router.
fn build_router(device: Device) -> Router {
    let state = Arc::new(AppState { device });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/random", get(handle_random))
        .route("/api/v1/entropy", post(handle_entropy))
        .route("/health", get(handle_health))
        .route("/pool/status", get(handle_pool_status))
        .with_state(state)
}

/// Run the HTTP server until it fails.
pub async fn run_server(device: Device, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(device);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await
}

// Simple hex encoding without external dep
mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eca30_core::{EngineConfig, SeedError, SeedSource};
    use std::time::{Duration, Instant};

    fn state(config: &EngineConfig) -> Arc<AppState> {
        Arc::new(AppState {
            device: Device::new(config).unwrap(),
        })
    }

    fn params(length: Option<usize>, data_type: Option<&str>) -> Query<RandomParams> {
        Query(RandomParams {
            length,
            data_type: data_type.map(str::to_string),
        })
    }

    #[test]
    fn test_encode_formats() {
        let raw = [0x01, 0x02, 0xab, 0xff, 0x07];
        assert_eq!(encode(&raw, "hex16"), serde_json::json!(["0102", "abff"]));
        assert_eq!(encode(&raw, "uint8"), serde_json::json!([1, 2, 171, 255, 7]));
        assert_eq!(encode(&raw, "uint16"), serde_json::json!([0x0201, 0xffab]));
        assert_eq!(encode(&raw, "hex"), serde_json::json!("0102abff07"));
    }

    #[tokio::test]
    async fn test_random_default_length() {
        let s = state(&EngineConfig::default());
        let (code, Json(resp)) = handle_random(State(Arc::clone(&s)), params(None, None)).await;
        assert_eq!(code, StatusCode::OK);
        assert!(resp.success);
        assert_eq!(resp.data_type, "hex16");
        assert_eq!(resp.length, 512);
        assert_eq!(s.device.status().stats.bytes_out, 1024);
    }

    #[tokio::test]
    async fn test_random_length_is_clamped() {
        let s = state(&EngineConfig::default());
        let (_, Json(resp)) =
            handle_random(State(Arc::clone(&s)), params(Some(0), Some("uint8"))).await;
        assert_eq!(resp.length, 1);

        let (_, Json(resp)) =
            handle_random(State(Arc::clone(&s)), params(Some(1_000_000), Some("uint8"))).await;
        assert_eq!(resp.length, MAX_LENGTH);
    }

    #[tokio::test]
    async fn test_random_matches_device_stream() {
        let s = state(&EngineConfig::default());
        let (_, Json(resp)) = handle_random(State(s), params(Some(4), Some("hex"))).await;

        let reference = Device::new(&EngineConfig::default()).unwrap();
        assert_eq!(resp.data, serde_json::json!(hex::encode(&reference.read(4).unwrap())));
    }

    #[tokio::test]
    async fn test_random_entropy_unavailable() {
        struct Offline;
        impl SeedSource for Offline {
            fn name(&self) -> &'static str {
                "offline"
            }
            fn fill_random(&mut self, _buf: &mut [u8]) -> Result<(), SeedError> {
                Err(SeedError::new("offline"))
            }
        }

        // An all-ones pool drains after one generation and cannot be refilled.
        let engine = eca30_core::Automaton::from_pool(eca30_core::BitRing::ones(), Box::new(Offline));
        let s = Arc::new(AppState {
            device: Device::from_engine(engine, &EngineConfig::default()),
        });
        let (code, Json(resp)) = handle_random(State(s), params(Some(8), None)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!resp.success);
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_slow_reseed_does_not_stall_runtime() {
        struct Sluggish;
        impl SeedSource for Sluggish {
            fn name(&self) -> &'static str {
                "sluggish"
            }
            fn fill_random(&mut self, _buf: &mut [u8]) -> Result<(), SeedError> {
                std::thread::sleep(Duration::from_millis(200));
                Err(SeedError::new("timed out"))
            }
        }

        let engine =
            eca30_core::Automaton::from_pool(eca30_core::BitRing::ones(), Box::new(Sluggish));
        let slow = Arc::new(AppState {
            device: Device::from_engine(engine, &EngineConfig::default()),
        });
        let fast = state(&EngineConfig::default());

        let start = Instant::now();
        let pending = tokio::spawn(handle_random(State(slow), params(Some(8), None)));
        tokio::task::yield_now().await;
        let Json(health) = handle_health(State(fast)).await;
        assert_eq!(health.status, "healthy");
        assert!(
            start.elapsed() < Duration::from_millis(150),
            "health check waited {:?} behind a reseed",
            start.elapsed()
        );

        let (code, _) = pending.await.unwrap();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_entropy_post() {
        let s = state(&EngineConfig::default());
        let (code, Json(resp)) =
            handle_entropy(State(Arc::clone(&s)), Bytes::from_static(b"hello")).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(resp.consumed, 5);
        let status = s.device.status();
        assert_eq!(status.stats.bytes_in, 5);
        assert_eq!(status.stats.steps, 40);
    }

    #[tokio::test]
    async fn test_entropy_post_read_only() {
        let s = state(&EngineConfig {
            writable: false,
            ..Default::default()
        });
        let (code, Json(resp)) =
            handle_entropy(State(Arc::clone(&s)), Bytes::from_static(b"hello")).await;
        assert_eq!(code, StatusCode::FORBIDDEN);
        assert!(!resp.success);
        assert_eq!(s.device.status().stats.bytes_in, 0);
    }

    #[tokio::test]
    async fn test_health_and_status() {
        let s = state(&EngineConfig::default());
        let Json(health) = handle_health(State(Arc::clone(&s))).await;
        assert_eq!(health.status, "healthy");
        assert!(health.live_cells > 0);

        let Json(status) = handle_pool_status(State(Arc::clone(&s))).await;
        assert_eq!(status["width_bits"], 257);
        assert_eq!(status["block_size"], 64);
        assert_eq!(status["bootstrap"], "rule30");
        assert_eq!(status["writable"], true);
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let s = state(&EngineConfig::default());
        let Json(index) = handle_index(State(s)).await;
        assert_eq!(index["version"], eca30_core::VERSION);
        assert!(index["endpoints"]["/api/v1/entropy"].is_object());
    }

    #[test]
    fn test_router_builds() {
        let _ = build_router(Device::new(&EngineConfig::default()).unwrap());
    }
}
