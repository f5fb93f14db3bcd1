//! # Shiftdesk 共有ユーティリティ
//!
//! BFF とその周辺ツールで共通に使うデータ構造と Observability 基盤を提供する。
//!
//! ## 設計方針
//!
//! - axum に依存しない（`IntoResponse` 変換は BFF 側の責務）
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - Observability 関連の依存は `observability` feature の背後に置く

pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use error_response::{ErrorCode, ErrorResponse};
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
