//! Writes the OpenAPI document as YAML.
//!
//! Usage: `cargo run --bin generate-openapi [output-path]` (defaults to `openapi.yml`).
//! The server URL is resolved like the server's own: `PUBLIC_URL`, falling
//! back to `http://localhost:$PORT`.

use salespad_outreach_api::{config, openapi};
use std::env;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let output = env::args().nth(1).unwrap_or_else(|| "openapi.yml".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;
    let server_url = config::public_url(env::var("PUBLIC_URL").ok(), port)?;

    let yaml = openapi::api_doc(&server_url).to_yaml()?;
    std::fs::write(&output, yaml)?;

    println!("Wrote OpenAPI spec to {}", output);
    Ok(())
}
