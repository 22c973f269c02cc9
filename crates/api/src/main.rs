use warden_infra::WardenConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WardenConfig::from_env()?;
    warden_observability::init(config.log_format);

    let port = config.port;
    let app = warden_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
