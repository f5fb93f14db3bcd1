//! # ヘルスチェックハンドラ
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（バックエンドへの到達性を確認する）

use std::{collections::BTreeMap, sync::Arc};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use shiftdesk_shared::{CheckStatus, HealthResponse, ReadinessResponse};

use crate::client::BackendClient;

/// BFF のヘルスチェックエンドポイント
#[utoipa::path(
   get,
   path = "/health",
   tag = "health",
   responses(
      (status = 200, description = "サーバー稼働中", body = HealthResponse)
   )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub backend_client: Arc<dyn BackendClient>,
}

/// BFF の Readiness Check エンドポイント
///
/// バックエンドが HTTP で応答すれば（ステータスは問わない）200、
/// 接続できなければ 503。
#[utoipa::path(
   get,
   path = "/health/ready",
   tag = "health",
   responses(
      (status = 200, description = "バックエンドに到達可能", body = ReadinessResponse),
      (status = 503, description = "バックエンドに到達できない", body = ReadinessResponse)
   )
)]
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let backend = match state.backend_client.probe().await {
        Ok(_) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check: backend probe failed");
            CheckStatus::Error
        }
    };

    let response = ReadinessResponse::from_checks(BTreeMap::from([("backend".to_string(), backend)]));
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
