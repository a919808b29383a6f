use std::io;
use std::path::Path;
use tracing::{Level, Metadata, Subscriber};
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "job_notifier.log";

const FILE_FILTER: &str = "info,job_feed=debug,notify=debug,web_request=debug";

// html5ever complains about the loose markup in feed descriptions
fn is_not_html5ever_warning(metadata: &Metadata<'_>) -> bool {
    !(metadata.level() == &Level::WARN && metadata.target().starts_with("html5ever"))
}

fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .with_filter(EnvFilter::new(FILE_FILTER))
        .with_filter(FilterFn::new(is_not_html5ever_warning))
}

pub fn configure_logging(log_dir: &Path) {
    let stdout_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,web_request=warn,notify=info,job_feed=info"));
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter)
        .with_filter(FilterFn::new(is_not_html5ever_warning));

    // Single append-only file, never rotated
    let file_appender = rolling::never(log_dir, LOG_FILE_NAME);

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_layer(file_appender))
        .init();
}
