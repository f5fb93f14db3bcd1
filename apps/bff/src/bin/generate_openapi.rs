//! # OpenAPI YAML 生成ツール
//!
//! BFF の OpenAPI 仕様を YAML 形式で標準出力に出力する。
//!
//! ```bash
//! cargo run --bin generate-openapi -p shiftdesk-bff > openapi/openapi.yaml
//! ```

use anyhow::Context as _;
use shiftdesk_bff::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .context("OpenAPI YAML 生成に失敗しました")?;
    print!("{yaml}");
    Ok(())
}
