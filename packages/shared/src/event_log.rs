//! # 構造化イベントログ
//!
//! `jq` でフィルタしやすいよう、ログフィールド名と値を定数で固定する。
//!
//! - ビジネスイベント: [`log_business_event!`]（`event.kind = "business_event"` を自動付与）
//! - エラーコンテキスト: `tracing::error!` に `error.category` / `error.kind` を付ける
//!
//! フィールド名はドット記法（`event.action`、`error.kind`）。JSON 出力ではフラットなキーになる。

/// ビジネスイベントを INFO レベルで出力する
///
/// 慣例として `event.category`、`event.action`、`event.result` を必ず指定する。
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ（オペレーションファミリーに対応）
    pub mod category {
        pub const AUTH: &str = "auth";
        pub const LEAVE: &str = "leave";
        pub const SHIFT: &str = "shift";
        pub const USER: &str = "user";
    }

    /// イベントアクション
    pub mod action {
        pub const LOGIN_SUCCESS: &str = "auth.login_success";
        pub const LOGIN_FAILURE: &str = "auth.login_failure";
        pub const LEAVE_REQUESTED: &str = "leave.requested";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 外部サービス（バックエンド API）呼び出し
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// クライアント入力
        pub const VALIDATION: &str = "validation";
    }

    /// エラー種別
    pub mod kind {
        pub const BACKEND_UNAVAILABLE: &str = "backend_unavailable";
        pub const BACKEND_COMMUNICATION: &str = "backend_communication";
        pub const BACKEND_RESPONSE_BODY: &str = "backend_response_body";
        pub const MISSING_TOKEN: &str = "missing_token";
        pub const MISSING_INPUT: &str = "missing_input";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_business_eventはサブスクライバなしでも呼べる() {
        crate::log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::LOGIN_SUCCESS,
            event.result = event::result::SUCCESS,
            "ログイン成功"
        );
    }

    #[test]
    fn test_エラー種別はスネークケース() {
        for kind in [
            error::kind::BACKEND_UNAVAILABLE,
            error::kind::BACKEND_COMMUNICATION,
            error::kind::BACKEND_RESPONSE_BODY,
            error::kind::MISSING_TOKEN,
            error::kind::MISSING_INPUT,
        ] {
            assert!(kind.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{kind}");
        }
    }
}
