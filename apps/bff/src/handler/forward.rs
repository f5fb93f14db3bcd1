//! # 転送ハンドラ
//!
//! すべての転送オペレーションが共有する唯一のハンドラ。
//! 処理は常に「事前検証 → 1 回の転送 → 結果の変換」の直線的な流れで、
//! リトライやリクエストをまたぐ状態は持たない。
//!
//! ## 事前検証の順序
//!
//! 1. 認証: Bearer トークン（`requires_auth` のオペレーションのみ）→ 401
//! 2. ボディ: JSON であること、必須フィールドが truthy であること → 400
//! 3. クエリ: 必須パラメータがあること → 400
//!
//! いずれかに失敗した場合、バックエンドは呼び出さない。
//!
//! ## 結果の変換
//!
//! - バックエンドが応答した場合: ステータスとボディをそのまま返す（2xx / 非 2xx とも）
//! - 呼び出しが完了しなかった場合: 500（ユーザー系の接続拒否は 503）

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use shiftdesk_shared::{
    event_log::{error, event},
    log_business_event,
};

use crate::{
    auth::extract_bearer_token,
    client::{BackendClient, BackendError, BackendResponse, OutboundRequest},
    error::{ErrorEnvelope, ForwardError},
    operation::{BodyPolicy, Operation},
};

/// 転送ハンドラの State
///
/// オペレーションごとに 1 つ作られる。
pub struct ForwardState {
    pub operation:      &'static Operation,
    pub backend_client: Arc<dyn BackendClient>,
    pub error_envelope: ErrorEnvelope,
}

/// リクエストをバックエンドへ転送する
#[tracing::instrument(skip_all, fields(operation))]
pub async fn forward(
    State(state): State<Arc<ForwardState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let operation = state.operation;
    tracing::Span::current().record("operation", operation.name);
    tracing::info!(path = operation.path, "リクエストを受信しました");

    let request = match prepare(operation, &headers, &query, &body) {
        Ok(request) => request,
        Err(e) => {
            let kind = match e {
                ForwardError::Unauthorized => error::kind::MISSING_TOKEN,
                _ => error::kind::MISSING_INPUT,
            };
            tracing::info!(
                error.category = error::category::VALIDATION,
                error.kind = kind,
                "事前検証に失敗しました: {}",
                e
            );
            return e.into_response_with(
                operation,
                state.error_envelope,
                state.backend_client.base_url(),
            );
        }
    };

    match state.backend_client.send(request).await {
        Ok(response) => {
            tracing::info!(backend.status = response.status.as_u16(), "バックエンドが応答しました");
            if let Some(body) = &response.body {
                tracing::debug!(
                    backend.body = %String::from_utf8_lossy(body),
                    "バックエンドのレスポンスボディ"
                );
            }
            log_outcome(operation, &response);
            pass_through(response)
        }
        Err(e) => {
            let kind = match e {
                BackendError::Unavailable(_) => error::kind::BACKEND_UNAVAILABLE,
                BackendError::Network(_) => error::kind::BACKEND_COMMUNICATION,
                BackendError::InvalidBody(_) => error::kind::BACKEND_RESPONSE_BODY,
            };
            tracing::error!(
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = kind,
                "バックエンド呼び出しに失敗しました: {}",
                e
            );
            ForwardError::from(e).into_response_with(
                operation,
                state.error_envelope,
                state.backend_client.base_url(),
            )
        }
    }
}

/// 事前検証を行い、バックエンドへのリクエストを組み立てる
pub fn prepare(
    operation: &Operation,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: &[u8],
) -> Result<OutboundRequest, ForwardError> {
    let bearer = if operation.requires_auth {
        Some(extract_bearer_token(headers).ok_or(ForwardError::Unauthorized)?)
    } else {
        None
    };

    let body = match operation.body {
        BodyPolicy::Ignore => None,
        BodyPolicy::Forward { required_fields } => {
            let value: Value =
                serde_json::from_slice(body).map_err(|_| ForwardError::InvalidBody)?;
            let missing = missing_fields(&value, required_fields);
            if !missing.is_empty() {
                return Err(ForwardError::MissingFields(missing));
            }
            // 検証にだけ使い、転送は受け取ったバイト列のまま行う
            Some(Bytes::copy_from_slice(body))
        }
    };

    let param = match operation.path_param {
        Some(name) => Some(
            query
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or(ForwardError::MissingQuery(name))?,
        ),
        None => None,
    };

    Ok(OutboundRequest {
        method: operation.method,
        path: operation.backend_path_for(param),
        bearer,
        body,
    })
}

/// 欠落または falsy な必須フィールドを返す
fn missing_fields(body: &Value, required: &'static [&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| !body.get(field).is_some_and(is_truthy))
        .collect()
}

/// JSON 値の truthiness（`null`、`false`、`0`、`""` は falsy）
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// バックエンドのステータスとボディをそのまま返す
///
/// ボディは再シリアライズせず、受け取ったバイト列を返す。
fn pass_through(response: BackendResponse) -> Response {
    match response.body {
        Some(body) => (
            response.status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        None => response.status.into_response(),
    }
}

/// 応答に対応する業務イベント（`event.action`、`event.result`）
fn outcome_event(
    operation: &Operation,
    response: &BackendResponse,
) -> Option<(&'static str, &'static str)> {
    let events = operation.business_events;
    if response.status.is_success() {
        events.on_success.map(|action| (action, event::result::SUCCESS))
    } else {
        events.on_failure.map(|action| (action, event::result::FAILURE))
    }
}

fn log_outcome(operation: &Operation, response: &BackendResponse) {
    if let Some((action, result)) = outcome_event(operation, response) {
        log_business_event!(
            event.category = operation.category,
            event.action = action,
            event.result = result,
            backend.status = response.status.as_u16(),
            "業務イベント: {}",
            operation.summary
        );
    }
}
