//! `zt serve`: runs the HTTP API until Ctrl-C.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use zt_db::Database;
use zt_server::AppState;

use crate::config::Session;

pub fn run(db: Database, session: &Session, bind_address: &str) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("failed to bind {bind_address}"))?;
        let state = AppState::new(db, session.server_settings());
        zt_server::serve(listener, state)
            .await
            .context("server error")
    })
}
