//! # Request ID 伝播ミドルウェア
//!
//! 呼び出し元 → BFF → バックエンドで同じ Request ID を使い、ログを突き合わせられるようにする。
//!
//! 1. `SetRequestIdLayer` が `x-request-id` を付与（クライアント提供値があればそれを使う）
//! 2. [`store_request_id`] がその値を task-local に保存
//! 3. [`inject_request_id`] がバックエンドへのリクエストに `x-request-id` を付与
//!
//! クライアントのメソッドシグネチャに Request ID を通さずに済むよう task-local を使う。

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use shiftdesk_shared::observability::REQUEST_ID_HEADER;
use tower_http::request_id::RequestId;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 現在のリクエストの Request ID
///
/// task-local スコープ外（テスト、起動時処理など）では `None`。
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// `RequestId` 拡張を task-local に保存して後続を実行する
///
/// `SetRequestIdLayer` より内側に配置すること。拡張がない場合は保存しない。
pub async fn store_request_id(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(ToString::to_string);

    match request_id {
        Some(id) => REQUEST_ID.scope(id, next.run(request)).await,
        None => next.run(request).await,
    }
}

/// reqwest のリクエストに `x-request-id` を付与する
pub fn inject_request_id(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match current_request_id() {
        Some(id) => builder.header(REQUEST_ID_HEADER, id),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_スコープ外ではnone() {
        assert_eq!(current_request_id(), None);
    }

    #[test]
    fn test_スコープ内では保存した値を返す() {
        let id = tokio_test::block_on(
            REQUEST_ID.scope("req-abc".to_string(), async { current_request_id() }),
        );

        assert_eq!(id.as_deref(), Some("req-abc"));
    }

    #[tokio::test]
    async fn test_スコープ内ではヘッダーを付与する() {
        let client = reqwest::Client::new();

        let request = REQUEST_ID
            .scope("req-123".to_string(), async {
                inject_request_id(client.get("http://example.com"))
                    .build()
                    .unwrap()
            })
            .await;

        assert_eq!(
            request.headers().get(REQUEST_ID_HEADER).unwrap(),
            "req-123"
        );
    }

    #[tokio::test]
    async fn test_スコープ外ではヘッダーを付与しない() {
        let client = reqwest::Client::new();
        let request = inject_request_id(client.get("http://example.com"))
            .build()
            .unwrap();

        assert!(request.headers().get(REQUEST_ID_HEADER).is_none());
    }
}
