//! # Bearer トークン抽出
//!
//! BFF は認証を行わない。`Authorization` ヘッダーからトークンを取り出し、
//! バックエンドへそのまま渡すだけ。

use std::fmt;

use axum::http::{HeaderMap, header::AUTHORIZATION};

/// `Authorization: Bearer <token>` から取り出した不透明なトークン
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// バックエンドへ送る `Authorization` ヘッダー値を組み立てる
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// トークンをログに出さない
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// ヘッダーから Bearer トークンを抽出する
///
/// スキーム名は大文字小文字を区別しない。トークンが空、スキームが `Bearer` 以外、
/// ヘッダー値が ASCII でない場合は `None`。
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<BearerToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(BearerToken(token.to_string()))
}
