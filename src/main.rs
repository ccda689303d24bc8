use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    autoposter::cli::run().await
}
