//! Logging setup using `tracing-subscriber`.
//!
//! Library events go to stderr so stdout stays clean for reports and JSON.
//! `RUST_LOG` overrides the level chosen from `-v`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level for a `-v` count: warnings by default, then info, debug and trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_from_verbosity(verbosity).to_string().to_lowercase();
        EnvFilter::new(format!("fiscalscope={level},fiscalscope_cli={level}"))
    })
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity))
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0), Level::WARN);
        assert_eq!(level_from_verbosity(1), Level::INFO);
        assert_eq!(level_from_verbosity(2), Level::DEBUG);
        assert_eq!(level_from_verbosity(9), Level::TRACE);
    }
}
