//! HTTP API over the chat loop and the local trace log.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, SessionTable};

use log::info;

/// Bind `addr` and serve the API until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening (addr={})", listener.local_addr()?);
    axum::serve(listener, app).await
}
