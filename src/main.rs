use tokio::net::TcpListener;

use lightchat::config::Config;
use lightchat::journal::Journal;
use lightchat::registry::Registry;
use lightchat::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    env_logger::Builder::new()
        .filter_level(config.log.level.as_level_filter())
        .parse_env("RUST_LOG")
        .init();

    let journal = match &config.journal.dir {
        Some(dir) => Journal::open(dir)?,
        None => Journal::null(),
    };

    let listener = TcpListener::bind(config.server.listen()).await?;
    log::info!("server running at http://localhost:{}", listener.local_addr()?.port());

    let registry = Registry::new(journal, || log::info!("websocket server running"));

    Server::new(listener, registry, config.options())
        .run(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on ctrl-c, or on SIGTERM where available.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                log::warn!("sigterm handler unavailable: err={}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    log::info!("shutdown requested");
}
