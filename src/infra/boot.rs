use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::random_org::RandomOrgClient;
use crate::domain::RandomIntegerSource;
use crate::infra::config::Config;
use crate::tools::tool_router::factory_with_source;

/// Build the random source from config and run the configured transport
/// until it closes.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        default_sides = cfg.default_sides,
        random_org = %cfg.random.base_url,
        "BOOT coin-flip-mcp"
    );

    let source: Arc<dyn RandomIntegerSource> = Arc::new(RandomOrgClient::from_config(&cfg.random)?);
    let factory = factory_with_source(source, cfg.default_sides);

    // Stdio mode: run MCP over stdio ONLY (no HTTP).
    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(factory)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(factory);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "MCP server listening on /mcp");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
