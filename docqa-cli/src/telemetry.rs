//! Logging setup.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "docqa=info,docqa_cli=info,docqa_rag=info,docqa_model=info";
const VERBOSE_FILTER: &str = "docqa=debug,docqa_cli=debug,docqa_rag=debug,docqa_model=debug";

/// The filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Install a stderr `fmt` subscriber. `RUST_LOG` takes precedence over
/// `verbose`. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_level() {
        assert!(default_filter(false).contains("docqa_rag=info"));
        assert!(default_filter(true).contains("docqa_rag=debug"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
