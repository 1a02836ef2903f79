use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_header, parse_interval_arg, parse_positive_rate,
    parse_positive_usize,
};
use super::types::{PositiveRate, PositiveUsize};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Steady healthy traffic (no error injection, runs until stopped)
    Good(PresetArgs),
    /// Error-heavy traffic for burn-rate and alerting tests
    Bad(PresetArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PresetArgs {
    /// Target base URL (scheme optional, e.g. 10.0.0.5:3000)
    #[arg(long, short = 'u', visible_alias = "url")]
    pub target: String,
}

#[derive(Debug, Parser, Clone)]
#[command(
    version,
    about = "Async HTTP traffic generator mixing healthy and error-inducing requests.",
    subcommand_negates_reqs = true
)]
pub struct TrafficArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a YAML, JSON or TOML config file
    #[arg(long, short = 'c', env = "TRAFFICGEN_CONFIG", required = true)]
    pub config: Option<String>,

    /// Override the request rate (requests per second)
    #[arg(long = "rate", short = 'q', global = true, value_parser = parse_positive_rate)]
    pub rate: Option<PositiveRate>,

    /// Override the run duration (supports ms/s/m/h)
    #[arg(long = "duration", short = 't', global = true, value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Override the maximum number of in-flight requests
    #[arg(long = "concurrency", global = true, value_parser = parse_positive_usize)]
    pub concurrency: Option<PositiveUsize>,

    /// Override the summary interval (0 disables periodic summaries)
    #[arg(long = "summary-interval", global = true, value_parser = parse_interval_arg)]
    pub summary_interval: Option<Duration>,

    /// Override the per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", global = true, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Override how long in-flight requests may finish during shutdown
    #[arg(long = "grace-period", global = true, value_parser = parse_interval_arg)]
    pub grace_period: Option<Duration>,

    /// Seed for endpoint selection and payload generation
    #[arg(long = "seed", global = true)]
    pub seed: Option<u64>,

    /// Extra HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Enable debug logging (per-request lines)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable ANSI colors in log output (`NO_COLOR=1` works too)
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,
}
