use anyhow::Result;
use shipper::runtime::{boot, serve};

#[tokio::main]
async fn main() -> Result<()> {
    let config = boot::boot()?;
    serve::serve(config).await
}
