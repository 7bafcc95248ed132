use mall_web::{WebConfig, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    mall_observability::init();

    let config = WebConfig::from_env()?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "starting web server"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_app(config)).await?;
    Ok(())
}
