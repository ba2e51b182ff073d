//! `openapi-mcp-server`: serve an `OpenAPI` document's operations as MCP tools over stdio.

mod config;
mod handler;
mod logging;

use anyhow::Context as _;
use clap::Parser;
use config::Args;
use handler::ProxyServer;
use openapi_mcp_tools::loader::load_document;
use openapi_mcp_tools::{Catalog, CatalogOptions, RequestExecutor, ToolDispatcher};
use rmcp::ServiceExt as _;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(&args.log_level, args.log_format)?;

    let proxy_config = args.proxy_config();

    let spec = load_document(&args.spec, &reqwest::Client::new())
        .await
        .with_context(|| format!("load OpenAPI spec '{}'", args.spec))?;
    let catalog = Catalog::build(
        &spec,
        CatalogOptions {
            base_url: proxy_config.base_url.as_deref(),
            document_location: Some(args.spec.as_str()),
        },
    )
    .context("build tool catalog")?;
    let executor = RequestExecutor::new(&proxy_config).context("build HTTP client")?;

    tracing::info!(
        name = %args.name,
        tools = catalog.len(),
        base_url = %catalog.base_url(),
        "Serving OpenAPI tools over stdio"
    );

    let server = ProxyServer::new(ToolDispatcher::new(Arc::new(catalog), executor), args.name);
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("start MCP stdio server")?;
    service.waiting().await.context("MCP stdio server")?;

    tracing::info!("Client disconnected; shutting down");
    Ok(())
}
