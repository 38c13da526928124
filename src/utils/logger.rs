use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 終端機閱讀用
    #[default]
    Compact,
    /// 每行一筆 JSON，供排程或集中式日誌收集
    Json,
}

/// 未設定 RUST_LOG 時的預設層級；verbose 時顯示本工具的 debug (含每批請求)
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "scout_import=debug,info"
    } else {
        "scout_import=info,warn"
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

pub fn init_logger(verbose: bool, format: LogFormat) {
    let (compact, json) = match format {
        LogFormat::Compact => (Some(fmt::layer().with_target(false).compact()), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().flatten_event(true).with_current_span(false)),
        ),
    };

    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(compact)
        .with(json)
        .init();
}
