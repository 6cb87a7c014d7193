#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stylotrace_lib::run().await
}
