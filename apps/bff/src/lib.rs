//! # BFF (Backend for Frontend) ライブラリ
//!
//! フロントエンドからのリクエストをバックエンド API へ転送するサーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーター構築
//! - `auth`: Bearer トークンの抽出
//! - `client`: バックエンド API クライアント
//! - `config`: 環境変数からの設定読み込み
//! - `error`: 転送エラーと失敗レスポンスの生成
//! - `handler`: HTTP ハンドラ（転送、ヘルスチェック）
//! - `middleware`: ミドルウェア（Request ID、キャッシュ制御）
//! - `openapi`: OpenAPI 仕様
//! - `operation`: 転送オペレーション定義テーブル

pub mod app_builder;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod openapi;
pub mod operation;
