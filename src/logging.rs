//! The `[log]` / `[warn]` / `[err]` stderr surface described in spec.md §6.
//!
//! Built on `tracing` so that concurrent writers (one per worker thread)
//! get a serialized, atomically-emitted line for free — the same property
//! `original_source/include/oss.hh`'s hand-rolled `osyncstream` shim gives
//! the C++ original.

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

struct BracketPrefix;

impl<S, N> FormatEvent<S, N> for BracketPrefix
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let prefix = match *event.metadata().level() {
            Level::ERROR => "[err]",
            Level::WARN => "[warn]",
            _ => "[log]",
        };
        write!(writer, "{prefix} ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global tracing subscriber. `verbose` toggles `[log]`
/// progress lines on top of the always-on `[warn]`/`[err]` surface.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .event_format(BracketPrefix)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();
    // A second `init()` (e.g. in tests) would panic on the global default
    // subscriber already being set; ignore, the first caller wins.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

macro_rules! log_err {
    ($($arg:tt)*) => { tracing::error!($($arg)*) };
}

pub(crate) use log_err;
pub(crate) use log_info;
pub(crate) use log_warn;
