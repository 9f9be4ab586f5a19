use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "uptime-monitor")]
#[command(version)]
#[command(about = "Polls HTTP endpoints and shows their uptime history as a live table")]
pub struct Cli {
    /// Path to the YAML (or .json) configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Seconds between check cycles
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of results kept per endpoint
    #[arg(long, value_name = "N")]
    pub history_size: Option<usize>,

    /// Maximum number of probes in flight at once
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// File that receives the probe and lifecycle log
    #[arg(long, default_value = "uptime-monitor.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            check_interval: self.interval,
            timeout: self.timeout,
            history_size: self.history_size,
            max_concurrency: self.max_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["uptime-monitor"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(cli.interval.is_none());
        assert_eq!(cli.log_file, PathBuf::from("uptime-monitor.log"));
    }

    #[test]
    fn overrides_are_collected() {
        let cli = Cli::try_parse_from([
            "uptime-monitor", "-c", "sites.json", "-i", "30", "--timeout", "4", "--history-size", "20",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(cli.config, PathBuf::from("sites.json"));
        assert_eq!(overrides.check_interval, Some(30));
        assert_eq!(overrides.timeout, Some(4));
        assert_eq!(overrides.history_size, Some(20));
        assert_eq!(overrides.max_concurrency, None);
    }

    #[test]
    fn rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["uptime-monitor", "--interval", "soon"]).is_err());
    }
}
