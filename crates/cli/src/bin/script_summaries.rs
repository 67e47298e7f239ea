use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    script_summaries_cli::main_entry().await
}
