//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! BFF がローカルに合成する失敗レスポンスの統一形式を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - 機械可読な識別子は [`ErrorCode`] で列挙し、`type` URI と `code` の両方に使う
//! - バックエンドが返したエラーボディはこの型に変換しない（パススルー）

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://shiftdesk.example.com/errors";

/// 失敗レスポンスの機械可読コード
///
/// kebab-case 文字列として `type` URI の末尾と `code` フィールドに出力される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCode {
    /// 必須のボディフィールドが欠落している
    MissingFields,
    /// リクエストボディが JSON として解釈できない
    InvalidBody,
    /// 必須のクエリパラメータが欠落している
    MissingParameter,
    /// Bearer トークンがない
    Unauthorized,
    /// ルートが存在しない
    NotFound,
    /// ルートはあるがメソッドが違う
    MethodNotAllowed,
    /// バックエンドに接続できない
    BackendUnavailable,
    /// 内部エラー
    InternalError,
}

impl ErrorCode {
    /// kebab-case の識別子を返す
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// HTTP ステータスコード
    pub fn status(self) -> u16 {
        match self {
            Self::MissingFields | Self::InvalidBody | Self::MissingParameter => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::InternalError => 500,
            Self::BackendUnavailable => 503,
        }
    }

    /// Problem Details の `title`
    pub fn title(self) -> &'static str {
        match self {
            Self::MissingFields => "Missing Fields",
            Self::InvalidBody => "Invalid Body",
            Self::MissingParameter => "Missing Parameter",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::BackendUnavailable => "Backend Unavailable",
            Self::InternalError => "Internal Server Error",
        }
    }
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `code` は RFC 9457 の拡張メンバー。クライアントは URI を解釈せずに
/// `code` で分岐できる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(as = ProblemDetails))]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub code:       String,
    pub detail:     String,
}

impl ErrorResponse {
    /// コードと詳細メッセージから作成する
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{}", code.as_str()),
            title:      code.title().to_string(),
            status:     code.status(),
            code:       code.as_str().to_string(),
            detail:     detail.into(),
        }
    }

    /// 400 Missing Fields
    ///
    /// `fields` はカンマ区切りで detail に列挙される。
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::new(
            ErrorCode::MissingFields,
            format!("{} は必須です", fields.join(", ")),
        )
    }

    /// 401 Unauthorized
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Bearer トークンが必要です")
    }

    /// 404 Not Found
    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{path} は存在しません"))
    }

    /// 405 Method Not Allowed
    pub fn method_not_allowed(method: &str, path: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotAllowed,
            format!("{path} は {method} に対応していません"),
        )
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(ErrorCode::InternalError, "内部エラーが発生しました")
    }

    /// 503 Backend Unavailable
    pub fn backend_unavailable(backend_url: &str) -> Self {
        Self::new(
            ErrorCode::BackendUnavailable,
            format!("バックエンド（{backend_url}）に接続できません"),
        )
    }
}
