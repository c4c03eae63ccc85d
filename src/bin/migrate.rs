use codemall_api::{config::AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = db::connect(&config.database).await?;
    db::migrate(&orm).await?;
    println!("Migrations applied");
    orm.close().await?;
    Ok(())
}
