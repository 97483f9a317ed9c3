mod host;
mod player;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
