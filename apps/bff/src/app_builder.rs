//! # BFF アプリケーション構築
//!
//! State の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中し、
//! 統合テストはこの関数でスタブのクライアントを注入したルーターを作る。

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, Uri},
    middleware::from_fn,
    routing::{get, on},
};
use shiftdesk_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    client::BackendClient,
    error::{ErrorEnvelope, method_not_allowed_response, not_found_response},
    handler::{ForwardState, ReadinessState, forward, health_check, readiness_check},
    middleware::{no_cache, request_id::store_request_id},
    operation::OPERATIONS,
};

/// ルーターを構築する
///
/// 転送ルートは [`OPERATIONS`] の各行から 1 つずつ生成する。
pub fn build_app(backend_client: Arc<dyn BackendClient>, error_envelope: ErrorEnvelope) -> Router {
    let readiness_state = Arc::new(ReadinessState {
        backend_client: backend_client.clone(),
    });

    let mut app = Router::new().route("/health", get(health_check)).merge(
        Router::new()
            .route("/health/ready", get(readiness_check))
            .with_state(readiness_state),
    );

    for operation in OPERATIONS {
        let state = Arc::new(ForwardState {
            operation,
            backend_client: backend_client.clone(),
            error_envelope,
        });
        app = app.merge(
            Router::new()
                .route(operation.path, on(operation.method.method_filter(), forward))
                .with_state(state),
        );
    }

    app.fallback(move |uri: Uri| async move { not_found_response(error_envelope, uri.path()) })
        .method_not_allowed_fallback(move |method: Method, uri: Uri| async move {
            method_not_allowed_response(error_envelope, method.as_str(), uri.path())
        })
        // キャッシュ制御: BFF のレスポンスは常にキャッシュさせない
        .layer(from_fn(no_cache))
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（クライアント提供値があればそれを使う）
        // 2. TraceLayer: request_id 入りのスパンを作り、全ログに注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに x-request-id をコピー
        // 4. store_request_id: task-local に保存し、バックエンドへのヘッダー伝播に使う
        .layer(from_fn(store_request_id))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
