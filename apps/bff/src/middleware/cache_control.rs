//! # キャッシュ制御ミドルウェア
//!
//! BFF はレスポンスをキャッシュしない。ブラウザや中間プロキシにも
//! キャッシュさせないよう、全レスポンスに `Cache-Control: no-store` を付与する。
//! バックエンドが別の値を返していても上書きする。

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

pub async fn no_cache(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
