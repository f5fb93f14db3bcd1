//! # OpenAPI 仕様定義
//!
//! ヘルスチェックは `#[utoipa::path]` から、転送ルートは
//! [`OPERATIONS`] テーブルから [`ForwardRoutesAddon`] で生成する。
//! 転送ルートのレスポンスボディはバックエンドのものをそのまま返すため、
//! スキーマを持たない。

use utoipa::{
    Modify,
    OpenApi,
    openapi::{
        path::{HttpMethod, OperationBuilder, PathItem},
        response::ResponseBuilder,
        security::{Http, HttpAuthScheme, SecurityRequirement, SecurityScheme},
    },
};

use crate::{
    handler::health,
    operation::{ForwardMethod, OPERATIONS},
};

/// Bearer 認証スキーム名
const BEARER_AUTH: &str = "bearer_auth";

#[derive(OpenApi)]
#[openapi(
   info(
      title = "Shiftdesk BFF API",
      version = "0.1.0",
      description = "休暇・シフト・ユーザー API をバックエンドへ転送する BFF"
   ),
   paths(health::health_check, health::readiness_check),
   components(schemas(shiftdesk_shared::ErrorResponse)),
   tags(
      (name = "health", description = "ヘルスチェック"),
      (name = "auth", description = "認証"),
      (name = "leave", description = "休暇"),
      (name = "shift", description = "シフト"),
      (name = "user", description = "ユーザー"),
   ),
   modifiers(&ForwardRoutesAddon)
)]
pub struct ApiDoc;

/// 転送ルートと Bearer 認証スキームを追加する
struct ForwardRoutesAddon;

impl Modify for ForwardRoutesAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );

        for op in OPERATIONS {
            let mut builder = OperationBuilder::new()
                .operation_id(Some(op.name))
                .summary(Some(op.summary))
                .tags(Some(vec![op.category.to_string()]))
                .response(
                    "2XX",
                    ResponseBuilder::new()
                        .description("バックエンドのレスポンスをそのまま返す")
                        .build(),
                )
                .response(
                    "500",
                    ResponseBuilder::new()
                        .description("バックエンドを呼び出せなかった")
                        .build(),
                );
            if !op.required_fields().is_empty() || op.path_param.is_some() {
                builder = builder.response(
                    "400",
                    ResponseBuilder::new()
                        .description("必須の入力が不足している")
                        .build(),
                );
            }
            if op.requires_auth {
                builder = builder
                    .security(SecurityRequirement::new(BEARER_AUTH, Vec::<String>::new()))
                    .response(
                        "401",
                        ResponseBuilder::new()
                            .description("Bearer トークンがない")
                            .build(),
                    );
            }
            if op.unavailable_as_503 {
                builder = builder.response(
                    "503",
                    ResponseBuilder::new()
                        .description("バックエンドに接続できない")
                        .build(),
                );
            }

            let method = match op.method {
                ForwardMethod::Get => HttpMethod::Get,
                ForwardMethod::Post => HttpMethod::Post,
            };
            openapi
                .paths
                .paths
                .insert(op.path.to_string(), PathItem::new(method, builder.build()));
        }
    }
}
