use clap::Args;
use tracing_subscriber::EnvFilter;

/// Logging arguments.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Tracing filter directives, e.g. `info,ingest::head=debug`.
    ///
    /// Ignored when `RUST_LOG` is set.
    #[arg(long = "log.filter", default_value = "info")]
    pub filter: String,
}

impl LogArgs {
    /// Returns the filter from `RUST_LOG`, falling back to `--log.filter`.
    pub fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[test]
    fn test_log_filter_default() {
        let cli = TestCli::parse_from(["test_app"]);
        assert_eq!(cli.log.filter, "info");
    }

    #[rstest]
    #[case("debug")]
    #[case("warn,ingest::head=trace")]
    #[case("storage=debug")]
    fn test_log_filter_parses(#[case] directives: &str) {
        let cli = TestCli::parse_from(["test_app", "--log.filter", directives]);
        assert!(EnvFilter::try_new(&cli.log.filter).is_ok());
    }
}
