use anyhow::Result;
use iguana::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
