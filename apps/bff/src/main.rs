//! # BFF (Backend for Frontend) サーバー
//!
//! フロントエンドとバックエンド API の間に位置する転送サーバー。
//!
//! ## 役割
//!
//! - **転送**: 各ルートのリクエストをバックエンドの対応パスへ 1 回だけ転送する
//! - **事前検証**: Bearer トークン、必須フィールド、必須クエリの有無を確認する
//! - **エラー整形**: 転送できなかった場合の失敗レスポンスを統一形式で返す
//!
//! 認証・業務ルール・データ保持はすべてバックエンドの責務。
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Browser    │────▶│     BFF      │────▶│   Backend    │
//! │              │     │  port: 3000  │     │  port: 4000  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `BFF_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `BFF_PORT` | No | ポート番号（デフォルト: `3000`） |
//! | `BACKEND_API_URL` | No | バックエンドのベース URL（デフォルト: `http://localhost:4000/api/v1`） |
//! | `ERROR_ENVELOPE` | No | 失敗レスポンスの形式 `problem` / `legacy`（デフォルト: `problem`） |
//! | `LOG_FORMAT` | No | ログ形式 `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p shiftdesk-bff
//!
//! BACKEND_API_URL=https://api.example.com/api/v1 LOG_FORMAT=json \
//!     cargo run -p shiftdesk-bff --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use shiftdesk_bff::{app_builder::build_app, client::BackendClientImpl, config::BffConfig};
use shiftdesk_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// BFF サーバーのエントリーポイント
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. ルーターの構築
/// 5. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("bff");
    init_tracing(&tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = %tracing_config.service_name).entered();

    let config = BffConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        backend_url = %config.backend_url,
        error_envelope = ?config.error_envelope,
        "BFF サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let backend_client = Arc::new(BackendClientImpl::new(&config.backend_url));
    let app = build_app(backend_client, config.error_envelope);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("BFF サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("BFF サーバーを停止しました");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C ハンドラの登録に失敗しました: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM ハンドラの登録に失敗しました: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
