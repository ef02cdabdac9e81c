use anyhow::Result;
use shard_core::ShardConfig;
use shard_images::ImagesSettings;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ShardConfig::from_env("SHARD");
    shard_images::init_tracing(&config);

    let addr = ImagesSettings::from_config(&config)?.listen_addr();
    let ax = shard_images::build(&config).await?;

    tracing::info!("[images] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
