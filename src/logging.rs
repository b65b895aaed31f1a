use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LogConfig;

/// tracing の購読者を初期化する。RUST_LOG があればそちらを優先
///
/// 二重初期化（テストから複数回呼ばれる場合など）はエラーにしない。
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    let _ = Registry::default().with(env_filter).with(stdout_layer).try_init();
}
