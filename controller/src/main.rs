mod dispatch;
mod gateway;
mod host;
mod store;
mod ticker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
