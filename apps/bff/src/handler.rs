//! # HTTP リクエストハンドラ
//!
//! - `forward`: 全転送オペレーション共通のハンドラ
//! - `health`: ヘルスチェック
//!
//! ハンドラは薄く保ち、業務ロジックはバックエンドに委譲する。

pub mod forward;
pub mod health;

pub use forward::{ForwardState, forward};
pub use health::{ReadinessState, health_check, readiness_check};
