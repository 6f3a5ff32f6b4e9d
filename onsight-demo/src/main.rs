use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    onsight_demo::run().await?;
    Ok(())
}
