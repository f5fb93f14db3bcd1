//! # バックエンド API クライアント
//!
//! BFF からバックエンド API への 1 回の HTTP 呼び出しを担当する。
//!
//! - リトライしない（失敗はそのまま呼び出し元へ返す）
//! - タイムアウトは reqwest のデフォルトに従う（Readiness プローブのみ 5 秒）
//! - リクエスト・レスポンスボディのスキーマは解釈しない（JSON であることだけを確認し、
//!   バイト列はそのまま中継する）

use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::IgnoredAny;
use thiserror::Error;

use crate::{auth::BearerToken, middleware::request_id::inject_request_id, operation::ForwardMethod};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// バックエンド呼び出しが完了しなかったことを表すエラー
///
/// バックエンドが非 2xx を返した場合はエラーではない（[`BackendResponse`] で返る）。
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// 接続できない（接続拒否、名前解決失敗など）
    #[error("バックエンドに接続できません: {0}")]
    Unavailable(String),

    /// ネットワークエラー（タイムアウト、通信途中の切断など）
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// レスポンスボディが JSON として解釈できない
    #[error("レスポンスボディが不正です: {0}")]
    InvalidBody(String),
}

impl BackendError {
    /// クライアントに見せてよい短い診断ラベル
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "backend unreachable",
            Self::Network(_) => "network error",
            Self::InvalidBody(_) => "invalid backend response",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            BackendError::Unavailable(err.to_string())
        } else if err.is_decode() {
            BackendError::InvalidBody(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// バックエンドへ送るリクエスト
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: ForwardMethod,
    /// ベース URL からの相対パス（先頭は `/`）
    pub path:   String,
    pub bearer: Option<BearerToken>,
    /// 検証済みの JSON ボディ（呼び出し元から受け取ったバイト列のまま）
    pub body:   Option<Bytes>,
}

/// バックエンドのレスポンス（ステータスと不透明な JSON ボディ）
///
/// ボディはキー順や数値表現を保つため、パースせずバイト列で持つ。
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    /// 空ボディの場合は `None`
    pub body:   Option<Bytes>,
}

/// バックエンド API クライアントトレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// 接続先のベース URL
    fn base_url(&self) -> &str;

    /// リクエストを 1 回だけ送信する
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, BackendError>;

    /// ベース URL に GET を送り、到達可能かを確認する
    ///
    /// ステータスコードは問わない（HTTP で応答があれば到達可能）。
    async fn probe(&self) -> Result<StatusCode, BackendError>;
}

/// バックエンド API クライアント実装
pub struct BackendClientImpl {
    base_url: String,
    client:   reqwest::Client,
}

impl BackendClientImpl {
    /// 新しい BackendClient を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: バックエンドのベース URL（例: `http://localhost:4000/api/v1`）
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client:   reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BackendClient for BackendClientImpl {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, BackendError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method.as_http(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.header(AUTHORIZATION, token.header_value());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = inject_request_id(builder).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            serde_json::from_slice::<IgnoredAny>(&bytes)
                .map_err(|e| BackendError::InvalidBody(e.to_string()))?;
            Some(bytes)
        };

        Ok(BackendResponse { status, body })
    }

    async fn probe(&self) -> Result<StatusCode, BackendError> {
        let response = inject_request_id(self.client.get(&self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;

    fn get(path: &str) -> OutboundRequest {
        OutboundRequest {
            method: ForwardMethod::Get,
            path:   path.to_string(),
            bearer: None,
            body:   None,
        }
    }

    #[test]
    fn test_newでベースurlの末尾スラッシュを除去する() {
        let client = BackendClientImpl::new("http://localhost:4000/api/v1/");

        assert_eq!(client.base_url(), "http://localhost:4000/api/v1");
    }

    #[tokio::test]
    async fn test_sendはjsonボディとヘッダーを送る() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/leave/create"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"reason": "rest"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClientImpl::new(&format!("{}/api/v1", server.uri()));
        let response = client
            .send(OutboundRequest {
                method: ForwardMethod::Post,
                path:   "/leave/create".to_string(),
                bearer: None,
                body:   Some(Bytes::from_static(br#"{"reason":"rest"}"#)),
            })
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, Some(Bytes::from_static(br#"{"id":1}"#)));
    }

    #[tokio::test]
    async fn test_レスポンスボディをバイト列のまま返す() {
        // キー順、範囲外の整数、末尾ゼロの小数が変わらないこと
        let raw = r#"{"zeta":1,"alpha":100000000000000000000,"price":1.10}"#;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(raw, "application/json"))
            .mount(&server)
            .await;

        let client = BackendClientImpl::new(&server.uri());
        let response = client.send(get("/raw")).await.unwrap();

        assert_eq!(response.body.as_deref(), Some(raw.as_bytes()));
    }

    #[tokio::test]
    async fn test_空ボディはnoneになる() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = BackendClientImpl::new(&server.uri());
        let response = client.send(get("/empty")).await.unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.body, None);
    }

    #[tokio::test]
    async fn test_json以外のボディはinvalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = BackendClientImpl::new(&server.uri());
        let result = client.send(get("/html")).await;

        assert!(matches!(result, Err(BackendError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn test_接続できない場合はunavailable() {
        // 空きポートを確保してすぐ閉じ、接続拒否を再現する
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = BackendClientImpl::new(&format!("http://{addr}"));
        let result = client.send(get("/anything")).await;

        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_probeはステータスを問わず応答を返す() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = BackendClientImpl::new(&server.uri());

        assert_eq!(client.probe().await.unwrap(), StatusCode::NOT_FOUND);
    }
}
