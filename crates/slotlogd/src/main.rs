// # slotlogd - slotlog daemon
//
// Thin integration layer: all correlation and storage logic lives in
// slotlog-core, all request handling in slotlog-http.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Opening the record store and building the ledger
// 4. Serving the router until SIGTERM/SIGINT
//
// ## Configuration
//
// - `SLOTLOG_BIND`: Listen address (default 0.0.0.0)
// - `PORT`: Listen port (default 3000)
// - `SLOTLOG_STORE_TYPE`: Record store (file, memory)
// - `SLOTLOG_DATA_DIR`: Directory for bucket files (default slot_data)
// - `SLOTLOG_MERGE_VISITS`: Log a visit for every slot request (default true)
// - `SLOTLOG_DISPLAY_OFFSET_SECS`: Seconds subtracted on the visits page (default 2)
// - `SLOTLOG_EVENT_CHANNEL_CAPACITY`: Ledger event buffer (default 1000)
// - `SLOTLOG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export SLOTLOG_DATA_DIR=/var/lib/slotlog
// export PORT=8080
//
// slotlogd
// ```

use anyhow::{Context, Result};
use slotlog_core::{
    DisplayConfig, LedgerConfig, ServerConfig, SlotLedger, SlotlogConfig, StoreConfig,
    TimeDisplay, open_store,
};
use slotlog_http::{AppState, build_router};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SlotlogExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SlotlogExitCode> for ExitCode {
    fn from(code: SlotlogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    bind: IpAddr,
    port: u16,
    store_type: String,
    data_dir: String,
    merge_visits: bool,
    display_offset_secs: u32,
    event_channel_capacity: usize,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, applying defaults for unset keys
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            bind: parse_var(&lookup, "SLOTLOG_BIND", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_var(&lookup, "PORT", 3000)?,
            store_type: lookup("SLOTLOG_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            data_dir: lookup("SLOTLOG_DATA_DIR").unwrap_or_else(|| "slot_data".to_string()),
            merge_visits: parse_var(&lookup, "SLOTLOG_MERGE_VISITS", true)?,
            display_offset_secs: parse_var(&lookup, "SLOTLOG_DISPLAY_OFFSET_SECS", 2)?,
            event_channel_capacity: parse_var(&lookup, "SLOTLOG_EVENT_CHANNEL_CAPACITY", 1000)?,
            log_level: lookup("SLOTLOG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "SLOTLOG_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        if self.store_type == "file" && self.data_dir.trim().is_empty() {
            anyhow::bail!("SLOTLOG_DATA_DIR cannot be empty when SLOTLOG_STORE_TYPE=file");
        }

        if self.port == 0 {
            anyhow::bail!("PORT must be between 1 and 65535");
        }

        if self.display_offset_secs > DisplayConfig::MAX_OFFSET_SECS {
            anyhow::bail!(
                "SLOTLOG_DISPLAY_OFFSET_SECS must be between 0 and {} seconds. Got: {}",
                DisplayConfig::MAX_OFFSET_SECS,
                self.display_offset_secs
            );
        }

        if self.event_channel_capacity == 0 {
            anyhow::bail!("SLOTLOG_EVENT_CHANNEL_CAPACITY must be greater than 0");
        }

        if parse_level(&self.log_level).is_none() {
            anyhow::bail!(
                "SLOTLOG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    /// Library configuration for the core crate
    fn to_slotlog_config(&self) -> SlotlogConfig {
        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            _ => StoreConfig::File {
                dir: self.data_dir.clone(),
            },
        };

        SlotlogConfig {
            server: ServerConfig {
                bind: self.bind,
                port: self.port,
            },
            store,
            ledger: LedgerConfig {
                merge_visits: self.merge_visits,
                event_channel_capacity: self.event_channel_capacity,
            },
            display: DisplayConfig {
                offset_secs: self.display_offset_secs,
            },
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} '{}' is not valid: {}", name, raw, e)),
        None => Ok(default),
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SlotlogExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SlotlogExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SlotlogExitCode::ConfigError.into();
    }

    info!("Starting slotlogd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SlotlogExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config.to_slotlog_config()).await {
            error!("Daemon error: {:#}", e);
            SlotlogExitCode::RuntimeError
        } else {
            SlotlogExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: SlotlogConfig) -> Result<()> {
    config.validate()?;

    info!("Store type: {}", config.store.type_name());
    if let StoreConfig::File { dir } = &config.store {
        info!("Data directory: {}", dir);
    }
    info!("Merge visits: {}", config.ledger.merge_visits);
    info!("Display offset: {}s", config.display.offset_secs);

    let store = open_store(&config.store).await?;
    let (ledger, mut events) = SlotLedger::new(store, &config.ledger)?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Ledger event");
        }
    });

    let state = Arc::new(AppState::new(
        ledger,
        TimeDisplay::from_config(&config.display),
    ));
    let app = build_router(Arc::clone(&state));

    let addr = SocketAddr::new(config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let shutdown = shutdown_signal()?;
    info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let signal = shutdown.await;
        info!("Received shutdown signal: {}", signal);
    })
    .await
    .context("Server error")?;

    info!("Shutting down daemon");
    state.ledger.flush().await?;

    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// Returns a future resolving to the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Install a CTRL-C handler
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
