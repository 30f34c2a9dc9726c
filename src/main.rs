use pledgeway::{App, ConfigBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pledgeway::init_tracing();

    let config = ConfigBuilder::new().from_env().build()?;
    App::with_config(config).serve().await?;

    Ok(())
}
