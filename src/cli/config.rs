//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, SearchArgs};
use crate::config::{StudioConfig, StudioConfigBuilder};
use anyhow::{Context, Result};

/// Most pages a single `search` may accumulate
const MAX_PAGES: usize = 10;

/// Convert CLI arguments to a `StudioConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Environment configuration with command-line overrides applied
    pub(crate) fn from_cli(cli: &Cli) -> Result<StudioConfig> {
        Self::from_cli_with_base(cli, StudioConfig::from_env())
    }

    pub(crate) fn from_cli_with_base(cli: &Cli, base: StudioConfig) -> Result<StudioConfig> {
        let mut builder = StudioConfigBuilder::from_config(base);
        if let Some(page_size) = cli.page_size {
            builder = builder.page_size(page_size);
        }
        if let Some(timeout) = cli.timeout {
            builder = builder.request_timeout_secs(timeout);
        }
        builder.build().context("Invalid configuration")
    }

    /// Validate search arguments
    pub(crate) fn validate_search(args: &SearchArgs) -> Result<()> {
        if args.pages == 0 || args.pages > MAX_PAGES {
            anyhow::bail!("--pages must be between 1 and {}, got {}", MAX_PAGES, args.pages);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("backdrop").chain(args.iter().copied()))
    }

    fn base() -> StudioConfig {
        StudioConfig::from_lookup(|name| match name {
            "UNSPLASH_ACCESS_KEY" => Some("u-key".to_string()),
            _ => None,
        })
    }

    #[test]
    fn test_cli_config_conversion() {
        let cli = parse(&["--page-size", "24", "--timeout", "5", "layouts"]);
        let config = CliConfigBuilder::from_cli_with_base(&cli, base()).unwrap();
        assert_eq!(config.page_size, 24);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.primary.api_key.as_deref(), Some("u-key"));
    }

    #[test]
    fn test_defaults_without_overrides() {
        let cli = parse(&["effects"]);
        let config = CliConfigBuilder::from_cli_with_base(&cli, base()).unwrap();
        assert_eq!(config.page_size, crate::config::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_cli_validation() {
        let cli = parse(&["--page-size", "99", "layouts"]);
        assert!(CliConfigBuilder::from_cli_with_base(&cli, base()).is_err());

        let cli = parse(&["search", "--pages", "0"]);
        let crate::cli::Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert!(CliConfigBuilder::validate_search(&args).is_err());

        let cli = parse(&["search", "--pages", "3"]);
        let crate::cli::Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert!(CliConfigBuilder::validate_search(&args).is_ok());
    }
}
