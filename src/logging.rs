use std::io::Write;

use time::OffsetDateTime;
use time::macros::format_description;

/// `HH:MM:SS  LEVEL  target  message`, with the crate prefix stripped from
/// targets. Debug builds log at `debug`, release at `info`; `RUST_LOG`
/// overrides both.
pub fn build_logger() -> env_logger::Builder {
    let time_fmt = format_description!("[hour]:[minute]:[second]");
    let mut builder = env_logger::Builder::new();
    builder.format(move |buf, record| {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let ts = now.format(&time_fmt).unwrap_or_else(|_| "??:??:??".into());
        let target = record
            .target()
            .strip_prefix("clip_trim::")
            .or_else(|| record.target().strip_prefix("clip_trim_core::"))
            .unwrap_or(record.target());
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{ts}  {style}{level:5}{style:#}  {target:5}  {message}",
            level = record.level(),
            message = record.args()
        )
    });

    #[cfg(debug_assertions)]
    builder.filter_level(log::LevelFilter::Debug);
    #[cfg(not(debug_assertions))]
    builder.filter_level(log::LevelFilter::Info);

    builder.parse_default_env();
    builder
}

/// Install the global logger. Later calls are no-ops.
pub fn init() {
    let _ = build_logger().try_init();
}
