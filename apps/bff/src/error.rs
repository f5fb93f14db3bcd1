//! # BFF エラーハンドリング
//!
//! 転送処理のエラー定義と、axum レスポンスへの変換。
//!
//! ## 失敗ボディの形式
//!
//! - [`ErrorEnvelope::Problem`]: 全オペレーション共通の RFC 9457 Problem Details
//! - [`ErrorEnvelope::Legacy`]: 既存クライアント互換。オペレーションごとの
//!   [`LegacyShape`] に従う
//!
//! どちらの形式でもステータスコードは同じ。バックエンドが返した非 2xx は
//! エラーではなくパススルーなので、ここは通らない。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use shiftdesk_shared::{ErrorCode, ErrorResponse};
use thiserror::Error;

use crate::{
    client::BackendError,
    operation::{LegacyShape, Operation},
};

/// ローカルで合成する失敗レスポンスの形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorEnvelope {
    /// RFC 9457 Problem Details（`{type, title, status, code, detail}`）
    #[default]
    Problem,
    /// オペレーションファミリーごとの旧形式
    Legacy,
}

impl ErrorEnvelope {
    /// 文字列からパースする。不正な値は `Problem` にフォールバックする
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "problem" => Self::Problem,
            "legacy" => Self::Legacy,
            other => {
                tracing::warn!("不明な ERROR_ENVELOPE={other:?} のため problem を使用します");
                Self::Problem
            }
        }
    }
}

/// 転送処理のエラー
#[derive(Debug, Error)]
pub enum ForwardError {
    /// 必須のボディフィールドが欠落または falsy
    #[error("必須フィールドが不足しています: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// ボディが JSON として解釈できない
    #[error("リクエストボディが JSON ではありません")]
    InvalidBody,

    /// 使える Bearer トークンがない
    #[error("Bearer トークンがありません")]
    Unauthorized,

    /// 必須のクエリパラメータがない
    #[error("クエリパラメータ {0} がありません")]
    MissingQuery(&'static str),

    /// バックエンド呼び出しが完了しなかった
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ForwardError {
    /// 機械可読コード
    pub fn code(&self, operation: &Operation) -> ErrorCode {
        match self {
            Self::MissingFields(_) => ErrorCode::MissingFields,
            Self::InvalidBody => ErrorCode::InvalidBody,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::MissingQuery(_) => ErrorCode::MissingParameter,
            Self::Backend(BackendError::Unavailable(_)) if operation.unavailable_as_503 => {
                ErrorCode::BackendUnavailable
            }
            Self::Backend(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self, operation: &Operation) -> StatusCode {
        StatusCode::from_u16(self.code(operation).status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 設定された形式でレスポンスに変換する
    ///
    /// `backend_url` は 503 のメッセージで接続先を示すために使う。
    pub fn into_response_with(
        self,
        operation: &Operation,
        envelope: ErrorEnvelope,
        backend_url: &str,
    ) -> Response {
        let status = self.status(operation);
        let body = match envelope {
            ErrorEnvelope::Problem => {
                serde_json::to_value(self.problem(operation, backend_url)).unwrap_or(Value::Null)
            }
            ErrorEnvelope::Legacy => self.legacy(operation, backend_url),
        };
        (status, Json(body)).into_response()
    }

    fn problem(&self, operation: &Operation, backend_url: &str) -> ErrorResponse {
        let code = self.code(operation);
        match self {
            Self::MissingFields(fields) => ErrorResponse::missing_fields(fields),
            Self::InvalidBody => {
                ErrorResponse::new(code, "リクエストボディは JSON である必要があります")
            }
            Self::Unauthorized => ErrorResponse::unauthorized(),
            Self::MissingQuery(name) => {
                ErrorResponse::new(code, format!("クエリパラメータ {name} は必須です"))
            }
            Self::Backend(_) if code == ErrorCode::BackendUnavailable => {
                ErrorResponse::backend_unavailable(backend_url)
            }
            Self::Backend(_) => ErrorResponse::internal_error(),
        }
    }

    fn legacy(&self, operation: &Operation, backend_url: &str) -> Value {
        let message = match self {
            Self::MissingFields(_) => required_message(operation.required_fields()),
            Self::InvalidBody => "Invalid JSON body".to_string(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::MissingQuery(name) => format!("{} is required", capitalize(name)),
            Self::Backend(_) if self.code(operation) == ErrorCode::BackendUnavailable => {
                format!("Backend service unavailable. Is the API running at {backend_url}?")
            }
            Self::Backend(_) => "Internal server error".to_string(),
        };

        match operation.legacy_shape {
            LegacyShape::Error => json!({ "error": message }),
            LegacyShape::Message => match self {
                Self::Backend(err) if operation.legacy_diagnostic => json!({
                    "success": "false",
                    "message": message,
                    "error": err.diagnostic(),
                }),
                _ => json!({ "success": "false", "message": message }),
            },
        }
    }
}

/// ルートが存在しない場合のレスポンス
pub fn not_found_response(envelope: ErrorEnvelope, path: &str) -> Response {
    let body = match envelope {
        ErrorEnvelope::Problem => {
            serde_json::to_value(ErrorResponse::not_found(path)).unwrap_or(Value::Null)
        }
        ErrorEnvelope::Legacy => json!({ "success": "false", "message": "Not found" }),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// ルートはあるがメソッドが違う場合のレスポンス
pub fn method_not_allowed_response(envelope: ErrorEnvelope, method: &str, path: &str) -> Response {
    let body = match envelope {
        ErrorEnvelope::Problem => serde_json::to_value(ErrorResponse::method_not_allowed(method, path))
            .unwrap_or(Value::Null),
        ErrorEnvelope::Legacy => json!({ "success": "false", "message": "Method not allowed" }),
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

/// `["email", "password"]` → `"Email and password are required"`
fn required_message(fields: &[&str]) -> String {
    let verb = if fields.len() > 1 { "are" } else { "is" };
    format!("{} {verb} required", capitalize(&fields.join(" and ")))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    use super::*;

    const BACKEND_URL: &str = "http://localhost:4000/api/v1";

    fn op(name: &str) -> &'static Operation {
        Operation::find(name).unwrap()
    }

    async fn render(
        err: ForwardError,
        name: &str,
        envelope: ErrorEnvelope,
    ) -> (StatusCode, Value) {
        let response = err.into_response_with(op(name), envelope, BACKEND_URL);
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_envelopeのパース() {
        assert_eq!(ErrorEnvelope::parse("legacy"), ErrorEnvelope::Legacy);
        assert_eq!(ErrorEnvelope::parse("problem"), ErrorEnvelope::Problem);
        assert_eq!(ErrorEnvelope::parse("unknown"), ErrorEnvelope::Problem);
    }

    #[test]
    fn test_required_message() {
        assert_eq!(
            required_message(&["email", "password"]),
            "Email and password are required"
        );
        assert_eq!(required_message(&["date"]), "Date is required");
    }

    #[test]
    fn test_接続拒否はユーザー系のみ503() {
        let err = ForwardError::Backend(BackendError::Unavailable("refused".to_string()));

        assert_eq!(err.status(op("list_users")), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.status(op("get_profile")), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.status(op("login")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.status(op("create_leave")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ネットワークエラーは常に500() {
        let err = ForwardError::Backend(BackendError::Network("timeout".to_string()));

        assert_eq!(err.status(op("list_users")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_problem形式の必須フィールドエラー() {
        let (status, body) = render(
            ForwardError::MissingFields(vec!["password"]),
            "login",
            ErrorEnvelope::Problem,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "missing-fields");
        assert_eq!(body["detail"], "password は必須です");
    }

    #[tokio::test]
    async fn test_problem形式の503は接続先を含む() {
        let (status, body) = render(
            ForwardError::Backend(BackendError::Unavailable("refused".to_string())),
            "get_profile",
            ErrorEnvelope::Problem,
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "backend-unavailable");
        assert!(body["detail"].as_str().unwrap().contains(BACKEND_URL));
    }

    #[tokio::test]
    async fn test_problem形式の500は原因を含まない() {
        let (status, body) = render(
            ForwardError::Backend(BackendError::Network("secret-host:5432".to_string())),
            "shift_status",
            ErrorEnvelope::Problem,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret-host"));
    }

    #[tokio::test]
    async fn test_legacy形式_loginの必須フィールド() {
        let (status, body) = render(
            ForwardError::MissingFields(vec!["password"]),
            "login",
            ErrorEnvelope::Legacy,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": "false", "message": "Email and password are required"})
        );
    }

    #[tokio::test]
    async fn test_legacy形式_休暇系はerrorキー() {
        let (status, body) =
            render(ForwardError::Unauthorized, "list_my_leave", ErrorEnvelope::Legacy).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));

        let (status, body) = render(
            ForwardError::Backend(BackendError::Network("reset".to_string())),
            "create_leave",
            ErrorEnvelope::Legacy,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_legacy形式_shift_statusは診断ラベルを含む() {
        let (_, body) = render(
            ForwardError::Backend(BackendError::InvalidBody("expected value".to_string())),
            "shift_status",
            ErrorEnvelope::Legacy,
        )
        .await;

        assert_eq!(
            body,
            json!({
                "success": "false",
                "message": "Internal server error",
                "error": "invalid backend response",
            })
        );
    }

    #[tokio::test]
    async fn test_legacy形式_shift_statusの日付なし() {
        let (status, body) = render(
            ForwardError::MissingQuery("date"),
            "shift_status",
            ErrorEnvelope::Legacy,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": "false", "message": "Date is required"}));
    }

    #[tokio::test]
    async fn test_legacy形式_ユーザー系の503() {
        let (status, body) = render(
            ForwardError::Backend(BackendError::Unavailable("refused".to_string())),
            "list_users",
            ErrorEnvelope::Legacy,
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["message"],
            "Backend service unavailable. Is the API running at http://localhost:4000/api/v1?"
        );
    }

    #[tokio::test]
    async fn test_405は設定された形式で返す() {
        let response = method_not_allowed_response(ErrorEnvelope::Legacy, "GET", "/api/auth/login");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"success": "false", "message": "Method not allowed"}));
    }
}
