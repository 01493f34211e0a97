//! Logging Infrastructure
//!
//! - Console output, pretty in development and JSON in production
//! - Daily rotating application logs (deleted after 14 days)
//! - Audit and security logs split into their own files (kept)

use std::fs;
use std::path::{Path, PathBuf};
use tracing::Metadata;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Clean up application log files older than the retention window
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // app.YYYY-MM-DD
        let Some(date_part) = name.strip_prefix("app.") else {
            continue;
        };
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(())
}

fn console_layer(level: &str, json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    }
}

fn file_layer(
    dir: PathBuf,
    prefix: &str,
    json: bool,
    keep: fn(&Metadata<'_>) -> bool,
) -> anyhow::Result<BoxedLayer> {
    fs::create_dir_all(&dir)?;
    let writer = std::sync::Mutex::new(RollingFileAppender::new(Rotation::DAILY, dir, prefix));
    let filter = tracing_subscriber::filter::filter_fn(keep);

    Ok(if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    })
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level or filter directive (e.g. "info", "shop_server=debug")
/// * `json_format` - JSON output (production) instead of pretty output
/// * `log_dir` - Optional directory for rolling file logs
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(level, json_format)];

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        layers.push(file_layer(log_dir.join("app"), "app", json_format, |meta| {
            meta.target() != "audit" && meta.target() != "security"
        })?);
        layers.push(file_layer(log_dir.join("audit"), "audit", json_format, |meta| {
            meta.target() == "audit"
        })?);
        layers.push(file_layer(
            log_dir.join("security"),
            "security",
            json_format,
            |meta| meta.target() == "security",
        )?);

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
        sleep(Duration::from_secs(3600)).await;
    }
}

/// Audit log helper - records admin and order operations
///
/// ```ignore
/// audit_log!(admin.id, "update_status", format!("order:{id}"), "SHIPPED");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($user_id:expr, $action:expr, $resource:expr) => {
        tracing::info!(
            target: "audit",
            user_id = %$user_id,
            action = $action,
            resource = %$resource,
            "AUDIT"
        );
    };
    ($user_id:expr, $action:expr, $resource:expr, $details:expr) => {
        tracing::info!(
            target: "audit",
            user_id = %$user_id,
            action = $action,
            resource = %$resource,
            details = %$details,
            "AUDIT"
        );
    };
}

/// Security log helper - records authentication events
///
/// ```ignore
/// security_log!(WARN, "login_failed", email = %email, reason = "bad_password");
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(target: "security", event = $event, $($arg)*)
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(target: "security", event = $event, $($arg)*)
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(target: "security", event = $event, $($arg)*)
    };
}
