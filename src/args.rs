use std::{net::IpAddr, path::PathBuf};

use clap::{Parser, ValueHint};

/// Directory managed when no path is given
pub const DEFAULT_BASE_DIR: &str = "/etc/wireguard";

/// Suffix of the files shown in listings
pub const DEFAULT_SUFFIX: &str = ".conf";

#[derive(Parser, Debug)]
#[command(name = "confserve", about, version)]
pub struct CliArgs {
    /// Be verbose, includes emitting access logs
    #[arg(short = 'v', long = "verbose", env = "CONFSERVE_VERBOSE")]
    pub verbose: bool,

    /// Directory holding the configuration files
    #[arg(
        value_hint = ValueHint::DirPath,
        env = "CONFSERVE_PATH",
        default_value = DEFAULT_BASE_DIR
    )]
    pub path: PathBuf,

    /// Only files ending with this suffix are listed
    #[arg(long = "suffix", default_value = DEFAULT_SUFFIX, env = "CONFSERVE_SUFFIX")]
    pub suffix: String,

    /// Port to use, 0 picks a free one
    #[arg(short = 'p', long = "port", default_value = "3000", env = "CONFSERVE_PORT")]
    pub port: u16,

    /// Interface to listen on
    #[arg(
        short = 'i',
        long = "interfaces",
        num_args = 1,
        env = "CONFSERVE_INTERFACE"
    )]
    pub interfaces: Vec<IpAddr>,

    /// Shown in the page title and heading
    #[arg(short = 't', long = "title", env = "CONFSERVE_TITLE")]
    pub title: Option<String>,

    /// Add security headers to every response
    #[arg(long = "security-headers", env = "CONFSERVE_SECURITY_HEADERS")]
    pub security_headers: bool,

    /// Content-Security-Policy value used with --security-headers
    #[arg(long = "csp", requires = "security_headers", env = "CONFSERVE_CSP")]
    pub csp: Option<String>,

    /// Limit the number of requests per client IP
    #[arg(long = "rate-limit", env = "CONFSERVE_RATE_LIMIT")]
    pub rate_limit: bool,

    /// Requests allowed per window and client IP
    #[arg(
        long = "rate-limit-requests",
        default_value = "60",
        env = "CONFSERVE_RATE_LIMIT_REQUESTS"
    )]
    pub rate_limit_requests: u32,

    /// Length of the rate limit window in seconds
    #[arg(
        long = "rate-limit-window",
        default_value = "60",
        env = "CONFSERVE_RATE_LIMIT_WINDOW"
    )]
    pub rate_limit_window: u64,

    /// Largest accepted request body, e.g. 512K or 1M
    #[arg(
        long = "max-request-size",
        default_value = "1M",
        value_parser = parse_size,
        env = "CONFSERVE_MAX_REQUEST_SIZE"
    )]
    pub max_request_size: usize,
}

/// Parses sizes like `100`, `10K`, `5MB` or `1g` into bytes (binary multiples)
pub fn parse_size(src: &str) -> Result<usize, String> {
    let src = src.trim();
    let upper = src.to_ascii_uppercase();
    let digits_end = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (number, unit) = upper.split_at(digits_end);

    if number.is_empty() {
        return Err(format!("Invalid size '{src}': expected a number"));
    }
    let number: usize = number
        .parse()
        .map_err(|e| format!("Invalid size '{src}': {e}"))?;

    let multiplier: usize = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => return Err(format!("Invalid size '{src}': unknown unit '{other}'")),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Invalid size '{src}': too large"))
}
