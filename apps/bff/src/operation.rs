//! # 転送オペレーション定義
//!
//! BFF が公開するルートと、その転送先・事前検証ルールを宣言的に定義する。
//! 転送処理そのものは [`crate::handler::forward`] の 1 箇所にあり、
//! 各ルートはこのテーブルの 1 行でパラメータ化される。
//!
//! | 名前 | メソッド | パス | 転送先 |
//! |------|----------|------|--------|
//! | `login` | POST | `/api/auth/login` | `/users/login` |
//! | `create_leave` | POST | `/api/leave/create` | `/leave/create` |
//! | `list_my_leave` | GET | `/api/leave/my` | `/leave/my` |
//! | `shift_status` | GET | `/api/shift/status` | `/shift/me/date/{date}` |
//! | `list_users` | GET | `/api/user/getall` | `/users/getall` |
//! | `get_profile` | GET | `/api/user/profile` | `/users/profile` |

use axum::{http::Method, routing::MethodFilter};
use shiftdesk_shared::event_log::event::{action, category};

/// 転送に使う HTTP メソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMethod {
    Get,
    Post,
}

impl ForwardMethod {
    pub fn method_filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
        }
    }

    pub fn as_http(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
        }
    }
}

/// リクエストボディの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// ボディを転送しない
    Ignore,
    /// JSON ボディをそのまま転送する。`required_fields` は truthy でなければならない
    Forward {
        required_fields: &'static [&'static str],
    },
}

/// `ERROR_ENVELOPE=legacy` のときの失敗ボディの形
///
/// 既存クライアントとの互換のため、オペレーションファミリーごとに異なる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyShape {
    /// `{ "success": "false", "message": ... }`
    Message,
    /// `{ "error": ... }`
    Error,
}

/// バックエンドの応答に応じて記録する業務イベント（`event.action` の値）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessEvents {
    /// 2xx のとき
    pub on_success: Option<&'static str>,
    /// 2xx 以外のとき
    pub on_failure: Option<&'static str>,
}

impl BusinessEvents {
    /// 業務イベントを記録しない
    pub const NONE: Self = Self {
        on_success: None,
        on_failure: None,
    };
}

/// 1 つの転送オペレーション
#[derive(Debug)]
pub struct Operation {
    /// ログと OpenAPI の operationId に使う識別子
    pub name:               &'static str,
    /// ログの `event.category` と OpenAPI のタグ
    pub category:           &'static str,
    pub summary:            &'static str,
    pub method:             ForwardMethod,
    /// BFF 側のパス
    pub path:               &'static str,
    /// バックエンド側のパス。`{name}` は `path_param` の値で置換される
    pub backend_path:       &'static str,
    pub body:               BodyPolicy,
    pub requires_auth:      bool,
    /// 必須クエリパラメータ（バックエンドのパスに埋め込む）
    pub path_param:         Option<&'static str>,
    /// 接続拒否を 503 で返すか（false なら 500）
    pub unavailable_as_503: bool,
    pub legacy_shape:       LegacyShape,
    /// legacy 形式の 500 に短い診断ラベルを含めるか
    pub legacy_diagnostic:  bool,
    pub business_events:    BusinessEvents,
}

/// 全オペレーション
pub static OPERATIONS: &[Operation] = &[
    Operation {
        name:               "login",
        category:           category::AUTH,
        summary:            "メールアドレスとパスワードでログインする",
        method:             ForwardMethod::Post,
        path:               "/api/auth/login",
        backend_path:       "/users/login",
        body:               BodyPolicy::Forward {
            required_fields: &["email", "password"],
        },
        requires_auth:      false,
        path_param:         None,
        unavailable_as_503: false,
        legacy_shape:       LegacyShape::Message,
        legacy_diagnostic:  false,
        business_events:    BusinessEvents {
            on_success: Some(action::LOGIN_SUCCESS),
            on_failure: Some(action::LOGIN_FAILURE),
        },
    },
    Operation {
        name:               "create_leave",
        category:           category::LEAVE,
        summary:            "休暇申請を作成する",
        method:             ForwardMethod::Post,
        path:               "/api/leave/create",
        backend_path:       "/leave/create",
        body:               BodyPolicy::Forward {
            required_fields: &[],
        },
        requires_auth:      true,
        path_param:         None,
        unavailable_as_503: false,
        legacy_shape:       LegacyShape::Error,
        legacy_diagnostic:  false,
        business_events:    BusinessEvents {
            on_success: Some(action::LEAVE_REQUESTED),
            on_failure: None,
        },
    },
    Operation {
        name:               "list_my_leave",
        category:           category::LEAVE,
        summary:            "自分の休暇申請一覧を取得する",
        method:             ForwardMethod::Get,
        path:               "/api/leave/my",
        backend_path:       "/leave/my",
        body:               BodyPolicy::Ignore,
        requires_auth:      true,
        path_param:         None,
        unavailable_as_503: false,
        legacy_shape:       LegacyShape::Error,
        legacy_diagnostic:  false,
        business_events:    BusinessEvents::NONE,
    },
    Operation {
        name:               "shift_status",
        category:           category::SHIFT,
        summary:            "指定日の自分のシフト状況を取得する",
        method:             ForwardMethod::Get,
        path:               "/api/shift/status",
        backend_path:       "/shift/me/date/{date}",
        body:               BodyPolicy::Ignore,
        requires_auth:      true,
        path_param:         Some("date"),
        unavailable_as_503: false,
        legacy_shape:       LegacyShape::Message,
        legacy_diagnostic:  true,
        business_events:    BusinessEvents::NONE,
    },
    Operation {
        name:               "list_users",
        category:           category::USER,
        summary:            "ユーザー一覧を取得する",
        method:             ForwardMethod::Get,
        path:               "/api/user/getall",
        backend_path:       "/users/getall",
        body:               BodyPolicy::Ignore,
        requires_auth:      true,
        path_param:         None,
        unavailable_as_503: true,
        legacy_shape:       LegacyShape::Message,
        legacy_diagnostic:  false,
        business_events:    BusinessEvents::NONE,
    },
    Operation {
        name:               "get_profile",
        category:           category::USER,
        summary:            "ログインユーザーのプロフィールを取得する",
        method:             ForwardMethod::Get,
        path:               "/api/user/profile",
        backend_path:       "/users/profile",
        body:               BodyPolicy::Ignore,
        requires_auth:      true,
        path_param:         None,
        unavailable_as_503: true,
        legacy_shape:       LegacyShape::Message,
        legacy_diagnostic:  false,
        business_events:    BusinessEvents::NONE,
    },
];

impl Operation {
    /// 名前でオペレーションを検索する
    #[cfg(test)]
    pub fn find(name: &str) -> Option<&'static Operation> {
        OPERATIONS.iter().find(|op| op.name == name)
    }

    /// バックエンド側のパスを組み立てる
    ///
    /// `path_param` がある場合、`value` をパーセントエンコードして埋め込む。
    pub fn backend_path_for(&self, value: Option<&str>) -> String {
        match (self.path_param, value) {
            (Some(name), Some(value)) => self
                .backend_path
                .replace(&format!("{{{name}}}"), &urlencoding::encode(value)),
            _ => self.backend_path.to_string(),
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self.body {
            BodyPolicy::Ignore => &[],
            BodyPolicy::Forward { required_fields } => required_fields,
        }
    }
}
