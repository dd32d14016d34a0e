use pupscore_server::{profile, server, storage};
mod cli;

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    use clap::Parser;
    let args = cli::Cli::parse();

    // Console-only logging with env-driven level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();

    if let Some(cmd) = args.command {
        match cmd {
            cli::Command::Stats {
                user,
                db_path,
                summary,
            } => {
                let db_path = db_path
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(default_db_path);
                std::process::exit(print_stats(&db_path, &user, summary).await);
            }
        }
    }

    let config = match server::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error=%e, "Failed to load config");
            std::process::exit(2);
        }
    };

    let db_path = default_db_path();
    // Ensure data dir exists when using default
    if let Some(parent) = std::path::Path::new(&db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = std::fs::create_dir_all(parent);
    }
    let store = match storage::Store::connect_sqlite(&db_path).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, path=%db_path, "Failed to connect DB");
            std::process::exit(3);
        }
    };

    if let Err(e) = store
        .seed_catalog(&config.achievements, &config.challenges)
        .await
    {
        tracing::error!(error=%e, "Failed to seed catalog");
        std::process::exit(4);
    }
    tracing::info!(
        achievements = config.achievements.len(),
        challenges = config.challenges.len(),
        "catalog seeded"
    );

    // Decide listen port: env PORT overrides config.listen_port, default 5252
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .or(config.listen_port)
        .unwrap_or(5252);

    let state = server::AppState::new(config, store);
    let shutdown_token = state.shutdown_token();
    let shutdown_token_for_server = shutdown_token.clone();

    let app = server::router(state);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error=%e, %addr, "Failed to bind listener");
            std::process::exit(5);
        }
    };

    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_token_for_server.cancelled_owned())
            .await
    });

    shutdown_signal().await;
    tracing::info!("shutdown: initiating graceful stop");
    // Also drops pending notification cooldown timers
    shutdown_token.cancel();
    match tokio::time::timeout(std::time::Duration::from_secs(3), &mut server_task).await {
        Ok(join_res) => match join_res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(%err, "server error"),
            Err(e) => tracing::error!(error=%e, "server task join error"),
        },
        Err(_) => {
            tracing::warn!("shutdown: forcing server abort due to timeout");
            server_task.abort();
        }
    }
}

fn default_db_path() -> String {
    std::env::var("DB_PATH").unwrap_or_else(|_| "data/app.db".into())
}

async fn print_stats(db_path: &str, user: &str, summary: bool) -> i32 {
    let store = match storage::Store::connect_sqlite(db_path).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, path=%db_path, "Failed to connect DB");
            return 3;
        }
    };
    let profile = match profile::load_profile(&store, user).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error=%e, user_id=%user, "Failed to load profile");
            return 6;
        }
    };
    let json = if summary {
        serde_json::to_string_pretty(&profile.stats_dto())
    } else {
        serde_json::to_string_pretty(&profile)
    };
    match json {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            tracing::error!(error=%e, "Failed to serialize profile");
            7
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(i), Ok(t)) => (i, t),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error=%e, "failed to install signal handlers");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("shutdown: received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("shutdown: received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown: received Ctrl+C");
    }
}
