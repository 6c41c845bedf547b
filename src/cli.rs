//! Command-line interface definitions for the digest binary.
//!
//! Flags override values from the optional YAML config file. The feed URL and
//! item limit can also be supplied through environment variables.

use clap::Parser;
use meta_digest::config::DigestConfig;
use std::path::PathBuf;

/// Command-line arguments for `meta_digest`.
///
/// # Examples
///
/// ```sh
/// # One digest of the default feed, printed to stdout
/// meta_digest
///
/// # A different feed, written to a file
/// NEWS_RSS_URL=https://example.com/feed.xml meta_digest -o ./digest.json
///
/// # Refresh every ten minutes, reusing cached descriptions
/// meta_digest -c ./meta_digest.yaml -o ./digest.json --every 600
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Feed to build the digest from
    #[arg(long, env = "NEWS_RSS_URL")]
    pub feed_url: Option<String>,

    /// Maximum number of items in the digest
    #[arg(short, long, env = "NEWS_LIMIT")]
    pub limit: Option<usize>,

    /// Write the digest JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,

    /// Rebuild the digest every SECS seconds instead of exiting after one run
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub every: Option<u64>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut DigestConfig) {
        if let Some(url) = &self.feed_url {
            config.feed_url = url.clone();
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["meta_digest"]);
        assert!(cli.config.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.pretty);
        assert!(cli.every.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "meta_digest",
            "-c",
            "/tmp/meta_digest.yaml",
            "-o",
            "/tmp/digest.json",
            "-l",
            "3",
        ]);

        assert_eq!(cli.config.as_deref(), Some("/tmp/meta_digest.yaml"));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/digest.json")));
        assert_eq!(cli.limit, Some(3));
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["meta_digest", "--every", "0"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "meta_digest",
            "--feed-url",
            "https://example.com/feed.xml",
            "--limit",
            "2",
        ]);
        let mut config = DigestConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.feed_url, "https://example.com/feed.xml");
        assert_eq!(config.limit, 2);
        assert_eq!(config.pacing_ms, DigestConfig::default().pacing_ms);
    }
}
