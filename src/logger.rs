use env_logger::Builder;
use log::info;
use log::LevelFilter;
use std::env;
use std::io::Write;

// Colored log format; RUST_LOG overrides the Info default.
pub fn setup_logger() {
    let mut builder = Builder::from_default_env();

    builder.format(|buf, record| {
        let level_color = match record.level() {
            log::Level::Error => "\x1B[1;31m", // Bold Red
            log::Level::Warn => "\x1B[1;33m",  // Bold Yellow
            log::Level::Info => "\x1B[1;32m",  // Bold Green
            log::Level::Debug => "\x1B[1;36m", // Bold Cyan
            log::Level::Trace => "\x1B[1;35m", // Bold Magenta
        };
        let reset = "\x1B[0m";

        writeln!(
            buf,
            "[{}] {}{}{} [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level_color,
            record.level(),
            reset,
            record.target(),
            record.args()
        )
    });

    if let Some(level) = default_filter(env::var("RUST_LOG").ok().as_deref()) {
        builder.filter(None, level);
    }

    builder.init();

    info!("Logger initialized");
}

// Info is the fallback only when no RUST_LOG directive is present.
fn default_filter(rust_log: Option<&str>) -> Option<LevelFilter> {
    match rust_log {
        Some(directive) if !directive.is_empty() => None,
        _ => Some(LevelFilter::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_directive_wins_over_the_info_default() {
        assert_eq!(default_filter(None), Some(LevelFilter::Info));
        assert_eq!(default_filter(Some("")), Some(LevelFilter::Info));
        assert_eq!(default_filter(Some("debug")), None);
        assert_eq!(default_filter(Some("mealgate=trace")), None);
    }
}
