//! # BFF 設定
//!
//! 環境変数から BFF サーバーの設定を読み込む。
//!
//! バックエンドの URL は起動時にここで 1 回だけ解決し、
//! 以降はすべてのオペレーションがこの値を使う。

use std::env;

use thiserror::Error;

use crate::error::ErrorEnvelope;

/// `BACKEND_API_URL` 未設定時の接続先（ローカル開発用）
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000/api/v1";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BFF_PORT は有効なポート番号である必要があります: {0:?}")]
    InvalidPort(String),

    #[error("BACKEND_API_URL が不正です: {value:?}（{reason}）")]
    InvalidBackendUrl { value: String, reason: String },
}

/// BFF サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BffConfig {
    /// バインドアドレス
    pub host:           String,
    /// ポート番号
    pub port:           u16,
    /// バックエンド API のベース URL（末尾の `/` は除去済み）
    pub backend_url:    String,
    /// ローカルで合成する失敗レスポンスの形式
    pub error_envelope: ErrorEnvelope,
}

impl BffConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を読み込む
    ///
    /// テストでプロセス環境変数を書き換えずに済むよう、検索を注入可能にしている。
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("BFF_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get("BFF_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let backend_url = match get("BACKEND_API_URL") {
            Some(raw) => normalize_backend_url(&raw)?,
            None => DEFAULT_BACKEND_URL.to_string(),
        };

        let error_envelope = get("ERROR_ENVELOPE")
            .map(|v| ErrorEnvelope::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            backend_url,
            error_envelope,
        })
    }
}

/// ベース URL を検証し、末尾の `/` を取り除く
fn normalize_backend_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidBackendUrl {
        value: raw.to_string(),
        reason,
    };

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "スキーム {} には対応していません",
            parsed.scheme()
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    // 環境変数の競合を避けるため、from_lookup に HashMap を渡して検証する

    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<BffConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BffConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_未設定のときデフォルト値になる() {
        let config = load(&[]).unwrap();

        assert_eq!(
            config,
            BffConfig {
                host:           "0.0.0.0".to_string(),
                port:           3000,
                backend_url:    "http://localhost:4000/api/v1".to_string(),
                error_envelope: ErrorEnvelope::Problem,
            }
        );
    }

    #[test]
    fn test_backend_urlの末尾スラッシュを除去する() {
        let config = load(&[("BACKEND_API_URL", "https://api.example.com/api/v1/")]).unwrap();

        assert_eq!(config.backend_url, "https://api.example.com/api/v1");
    }

    #[test]
    fn test_空のbackend_urlはフォールバックする() {
        let config = load(&[("BACKEND_API_URL", "  ")]).unwrap();

        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_不正なbackend_urlはエラー() {
        let result = load(&[("BACKEND_API_URL", "not a url")]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidBackendUrl { .. })
        ));
    }

    #[test]
    fn test_http以外のスキームはエラー() {
        let result = load(&[("BACKEND_API_URL", "ftp://files.example.com")]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidBackendUrl { .. })
        ));
    }

    #[test]
    fn test_不正なポートはエラー() {
        let result = load(&[("BFF_PORT", "99999")]);

        assert_eq!(result, Err(ConfigError::InvalidPort("99999".to_string())));
    }

    #[test]
    fn test_error_envelopeを読み込む() {
        let config = load(&[("ERROR_ENVELOPE", "legacy"), ("BFF_PORT", "13000")]).unwrap();

        assert_eq!(config.error_envelope, ErrorEnvelope::Legacy);
        assert_eq!(config.port, 13000);
    }
}
