//! # 外部 API クライアント
//!
//! バックエンド API との通信を担当する。

pub mod backend;

pub use backend::{
    BackendClient,
    BackendClientImpl,
    BackendError,
    BackendResponse,
    OutboundRequest,
};
