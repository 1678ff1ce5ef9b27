//! Server: bind and serve the metadata router over plain HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::MetadataResult;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::MetadataStore;

/// Serve the metadata API on an already-bound listener until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> MetadataResult<()> {
    let addr = listener.local_addr()?;
    info!("Metadata API listening on: http://{}", addr);
    info!("  - Documents: http://{}/metadata/JSON", addr);
    info!("  - Storage directory: {}", state.store.dir().display());

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Blocking entry point: builds a private runtime and serves on `addr`.
///
/// Meant to be called from a dedicated thread; it only returns when binding or
/// serving fails. Callers pick the interface; pass a loopback address unless
/// the API must be reachable from other hosts.
pub fn start_api(addr: SocketAddr, meta_dir: impl Into<PathBuf>) -> MetadataResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("metadata-api")
        .build()?;

    let state = AppState::new(MetadataStore::new(meta_dir));

    runtime.block_on(async move {
        let listener = TcpListener::bind(addr).await?;
        serve(listener, state).await
    })
}
