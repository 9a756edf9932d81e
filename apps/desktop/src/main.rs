#[tokio::main]
async fn main() -> anyhow::Result<()> {
    synora_lib::run().await
}
