use crate::blind::BlindStatus;
use crate::bridge::{Bridge, BridgeStats};
use crate::dispatch::{DispatchSnapshot, DispatchStats};
use crate::model::{DeviceCapability, Entity, EntityAddress};
use crate::state::EntityHandle;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the status API
pub struct StatusAppState {
    pub bridge: Arc<Bridge>,
    /// Present when frames arrive through a dispatcher
    pub dispatch: Option<Arc<DispatchStats>>,
}

/// Entity response: address, classification and the wire-form state
#[derive(Serialize)]
pub struct EntityResponse {
    pub id: i64,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<DeviceCapability>,
    pub state: serde_json::Value,
}

impl EntityResponse {
    fn from_handle<T: Entity>(handle: &EntityHandle<T>) -> Self {
        Self {
            id: handle.id(),
            address: handle.address().to_string(),
            capability: handle.capability(),
            state: serde_json::to_value(handle.snapshot())
                .unwrap_or(serde_json::Value::Object(Default::default())),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bridge_id: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub bridge: BridgeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchSnapshot>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create status API router
pub fn create_status_router(state: Arc<StatusAppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/:id", get(get_device))
        .route("/api/groups", get(list_groups))
        .route("/api/groups/:id", get(get_group))
        .route("/api/groups/:id/scenes", get(list_scenes))
        .route("/api/gateway", get(get_gateway))
        .route("/api/blinds/:id", get(get_blind))
        .route("/api/stats", get(stats))
        .with_state(state)
}

/// GET /api/health
async fn health(State(state): State<Arc<StatusAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        bridge_id: state.bridge.id().to_string(),
    })
}

/// GET /api/devices - every known device, ordered by id
async fn list_devices(State(state): State<Arc<StatusAppState>>) -> Json<Vec<EntityResponse>> {
    let devices = state.bridge.store().devices();
    Json(devices.iter().map(|d| EntityResponse::from_handle(d)).collect())
}

/// GET /api/devices/:id
async fn get_device(
    State(state): State<Arc<StatusAppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EntityResponse>, StatusError> {
    let device = state.bridge.store().device(id).ok_or(StatusError::NotFound("Device"))?;
    Ok(Json(EntityResponse::from_handle(&device)))
}

/// GET /api/groups
async fn list_groups(State(state): State<Arc<StatusAppState>>) -> Json<Vec<EntityResponse>> {
    let groups = state.bridge.store().groups();
    Json(groups.iter().map(|g| EntityResponse::from_handle(g)).collect())
}

/// GET /api/groups/:id
async fn get_group(
    State(state): State<Arc<StatusAppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EntityResponse>, StatusError> {
    let group = state.bridge.store().group(id).ok_or(StatusError::NotFound("Group"))?;
    Ok(Json(EntityResponse::from_handle(&group)))
}

/// GET /api/groups/:id/scenes
async fn list_scenes(
    State(state): State<Arc<StatusAppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EntityResponse>>, StatusError> {
    if state.bridge.store().group(id).is_none() {
        return Err(StatusError::NotFound("Group"));
    }
    let scenes = state.bridge.store().scenes_of(id);
    Ok(Json(scenes.iter().map(|s| EntityResponse::from_handle(s)).collect()))
}

/// GET /api/gateway
async fn get_gateway(
    State(state): State<Arc<StatusAppState>>,
) -> Result<Json<EntityResponse>, StatusError> {
    let gateway = state.bridge.store().gateway().ok_or(StatusError::NotFound("Gateway"))?;
    Ok(Json(EntityResponse::from_handle(&gateway)))
}

/// GET /api/blinds/:id - tracked motion state of a window covering
async fn get_blind(
    State(state): State<Arc<StatusAppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BlindStatus>, StatusError> {
    state
        .bridge
        .blinds()
        .status(&EntityAddress::device(id))
        .map(Json)
        .ok_or(StatusError::NotFound("Blind"))
}

/// GET /api/stats
async fn stats(State(state): State<Arc<StatusAppState>>) -> Json<StatsResponse> {
    let dispatch = state.dispatch.as_ref().map(|stats| stats.snapshot());

    Json(StatsResponse {
        bridge: state.bridge.stats(),
        dispatch,
    })
}

/// Status API error types
#[derive(Debug)]
enum StatusError {
    NotFound(&'static str),
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            StatusError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::testing::RecordingPublisher;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<Bridge>) {
        let bridge = Bridge::new(
            Arc::new(RecordingPublisher::new()),
            "status-test",
            &BridgeConfig::default(),
        );
        let router = create_status_router(Arc::new(StatusAppState {
            bridge: Arc::clone(&bridge),
            dispatch: None,
        }));
        (router, bridge)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_get_device() {
        let (router, bridge) = app();
        bridge
            .store()
            .ingest(
                EntityAddress::device(65537),
                br#"{"9001":"Lamp","5750":2,"3311":[{"5850":1,"5851":254}]}"#,
            )
            .unwrap();

        let (status, body) = get_json(router, "/api/devices/65537").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 65537);
        assert_eq!(body["address"], "15001/65537");
        assert_eq!(body["capability"], "light");
        assert_eq!(body["state"]["3311"][0]["5851"], 254);
    }

    #[tokio::test]
    async fn test_unknown_device_is_404() {
        let (router, _) = app();

        let (status, body) = get_json(router, "/api/devices/1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Device not found");
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();

        let (status, body) = get_json(router, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bridge_id"], "status-test");
    }

    #[tokio::test]
    async fn test_stats_include_dispatch_counters() {
        let bridge = Bridge::new(
            Arc::new(RecordingPublisher::new()),
            "status-test",
            &BridgeConfig::default(),
        );
        let router = create_status_router(Arc::new(StatusAppState {
            bridge,
            dispatch: Some(Arc::new(DispatchStats::default())),
        }));

        let (status, body) = get_json(router, "/api/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bridge_id"], "status-test");
        assert_eq!(body["dispatch"]["received"], 0);
        assert_eq!(body["dispatch"]["in_flight"], 0);
    }
}
