//! Utilities: logging setup (level derived from -v / -q, `RUST_LOG` wins).
//!
//! Key items:
//!   derive_level / init_logging

/// Logging helpers.
pub mod logging {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{EnvFilter, fmt};

    /// Map the global verbosity flags onto a level for this crate.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Directive used when `RUST_LOG` is unset: dependencies stay at warn.
    pub fn default_directive(level: LevelFilter) -> String {
        let ours = level.to_string().to_ascii_lowercase();
        if level < LevelFilter::WARN {
            // error or off: quiet everything
            return ours;
        }
        format!("warn,connect_cli={ours}")
    }

    /// Install the global subscriber. Logs go to stderr so stdout stays
    /// the command report. Safe to call more than once.
    pub fn init_logging(level: LevelFilter) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

#[cfg(test)]
mod tests {
    use super::logging::default_directive;
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(derive_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(derive_level(0, false), LevelFilter::WARN);
        assert_eq!(derive_level(1, false), LevelFilter::INFO);
        assert_eq!(derive_level(2, false), LevelFilter::DEBUG);
        assert_eq!(derive_level(7, false), LevelFilter::TRACE);
    }

    #[test]
    fn directive_scopes_crate_level() {
        assert_eq!(default_directive(LevelFilter::DEBUG), "warn,connect_cli=debug");
        assert_eq!(default_directive(LevelFilter::WARN), "warn,connect_cli=warn");
        assert_eq!(default_directive(LevelFilter::ERROR), "error");
    }
}
