//! Newsdesk - Financial news analysis with a locally hosted LLM

use anyhow::Result;

use newsdesk::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (NEWSDESK_LLM_HOST / NEWSDESK_LLM_MODEL)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
