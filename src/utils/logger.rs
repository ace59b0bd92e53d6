use crate::config::toml_config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RUST_LOG 優先於配置檔中的設定
fn env_filter(logging: &LoggingConfig, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.directive(verbose)))
}

pub fn init_cli_logger(logging: &LoggingConfig, verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(logging, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 嵌入到服務時使用 JSON 格式，方便集中收集日誌
pub fn init_service_logger(logging: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(env_filter(logging, false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
