#[tokio::main]
async fn main() -> anyhow::Result<()> {
    learning_platform_backend::run().await
}
