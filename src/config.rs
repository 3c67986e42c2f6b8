//! Configuration validation module
//!
//! Turns parsed command line arguments into the runtime configuration, after
//! running them through the `ConfigValidator` checks.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    path::PathBuf,
};

use actix_web::http::header::HeaderValue;
use anyhow::{Context, Result, anyhow};

use crate::{
    args::CliArgs,
    errors::{ConfigValidationError, log_validation_failure},
    security::{DEFAULT_CSP, RateLimitConfig, SecurityConfig},
    store::ConfigStore,
};

/// Trait for validating configuration options and their combinations
pub trait ConfigValidator {
    /// Validate all configuration rules and return detailed errors
    fn validate(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>>;

    /// Validate port configuration
    fn validate_port(&self, port: u16) -> Result<(), ConfigValidationError>;

    /// Validate the base directory
    fn validate_paths(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>>;

    /// Validate the listing suffix
    fn validate_suffix(&self, suffix: &str) -> Result<(), ConfigValidationError>;

    /// Validate rate limiting, request size and header settings
    fn validate_security_config(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>>;
}

/// Implementation of configuration validation
pub struct ConfServeConfigValidator;

impl ConfigValidator for ConfServeConfigValidator {
    fn validate(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if let Err(err) = self.validate_port(args.port) {
            errors.push(err);
        }

        if let Err(mut path_errors) = self.validate_paths(args) {
            errors.append(&mut path_errors);
        }

        if let Err(err) = self.validate_suffix(&args.suffix) {
            errors.push(err);
        }

        if let Err(mut security_errors) = self.validate_security_config(args) {
            errors.append(&mut security_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_port(&self, port: u16) -> Result<(), ConfigValidationError> {
        if port > 0 && port < 1024 {
            #[cfg(unix)]
            {
                return Err(ConfigValidationError::PortError {
                    port,
                    suggestion: format!(
                        "Port {port} is a privileged port (0-1023). Use a port >= 1024 or put a reverse proxy in front"
                    ),
                });
            }
        }

        if port > 0 && std::net::TcpListener::bind(("127.0.0.1", port)).is_err() {
            return Err(ConfigValidationError::PortError {
                port,
                suggestion: format!(
                    "Port {port} is already in use or unavailable. Try a different port or pass --port 0 to pick a free one"
                ),
            });
        }

        Ok(())
    }

    fn validate_paths(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>> {
        let path = &args.path;

        let error = if !path.exists() {
            Some(ConfigValidationError::PathError {
                path: path.display().to_string(),
                reason: "Path does not exist".to_string(),
                suggestion: format!("Create the directory with: mkdir -p '{}'", path.display()),
            })
        } else if !path.is_dir() {
            Some(ConfigValidationError::PathError {
                path: path.display().to_string(),
                reason: "Path is not a directory".to_string(),
                suggestion: "Point confserve at the directory holding the configuration files"
                    .to_string(),
            })
        } else {
            None
        };

        match error {
            Some(error) => Err(vec![error]),
            None => Ok(()),
        }
    }

    fn validate_suffix(&self, suffix: &str) -> Result<(), ConfigValidationError> {
        if suffix.contains(['/', '\\', '\0']) {
            return Err(ConfigValidationError::SuffixError {
                suffix: suffix.to_string(),
                reason: "Suffix contains a path separator or NUL byte".to_string(),
                suggestion: "Use a plain file extension such as '.conf'".to_string(),
            });
        }
        Ok(())
    }

    fn validate_security_config(&self, args: &CliArgs) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if args.rate_limit {
            if args.rate_limit_requests == 0 {
                errors.push(ConfigValidationError::SecurityError {
                    reason: "--rate-limit-requests is 0, every request would be rejected"
                        .to_string(),
                    suggestion: "Allow at least one request per window".to_string(),
                });
            }
            if args.rate_limit_window == 0 {
                errors.push(ConfigValidationError::SecurityError {
                    reason: "--rate-limit-window is 0 seconds".to_string(),
                    suggestion: "Use a window of at least one second".to_string(),
                });
            }
        }

        if args.max_request_size == 0 {
            errors.push(ConfigValidationError::SecurityError {
                reason: "--max-request-size is 0, no configuration could be created".to_string(),
                suggestion: "Use a limit such as 64K or 1M".to_string(),
            });
        }

        if let Some(ref csp) = args.csp {
            if HeaderValue::from_str(csp).is_err() {
                errors.push(ConfigValidationError::SecurityError {
                    reason: "--csp contains characters not allowed in a header value".to_string(),
                    suggestion: "Remove line breaks and non-visible characters from the policy"
                        .to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
/// Configuration of the confserve application
pub struct ConfServeConfig {
    /// Enable verbose mode
    pub verbose: bool,

    /// Directory holding the managed configuration files
    pub path: PathBuf,

    /// Suffix a file must carry to show up in listings
    pub suffix: String,

    /// Port on which confserve will be listening
    pub port: u16,

    /// IP address(es) on which confserve will be available
    pub interfaces: Vec<IpAddr>,

    /// Shown in page title and heading
    pub title: String,

    /// Well-known healthcheck route
    pub healthcheck_route: String,

    /// Headers, rate limiting and body size limit
    pub security: SecurityConfig,
}

impl ConfServeConfig {
    /// Parses the command line arguments with comprehensive validation
    pub fn try_from_args(args: CliArgs) -> Result<Self> {
        let validator = ConfServeConfigValidator;
        if let Err(validation_errors) = validator.validate(&args) {
            for error in &validation_errors {
                log_validation_failure(error, "ConfServeConfig::try_from_args");
            }

            // A missing base directory is reported on listing instead of refusing to start
            if let Some(first_error) = validation_errors
                .into_iter()
                .find(|e| !matches!(e, ConfigValidationError::PathError { .. }))
            {
                return Err(anyhow!(first_error));
            }
        }

        let interfaces = if !args.interfaces.is_empty() {
            args.interfaces
        } else {
            vec![
                IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ]
        };

        let port = match args.port {
            0 => port_check::free_local_port().context("No free ports available")?,
            _ => args.port,
        };

        let security = SecurityConfig {
            enable_security_headers: args.security_headers,
            enable_rate_limiting: args.rate_limit,
            max_request_size: args.max_request_size,
            rate_limit_config: RateLimitConfig {
                max_requests: args.rate_limit_requests,
                window_size: args.rate_limit_window,
            },
            csp: args.csp.unwrap_or_else(|| DEFAULT_CSP.to_string()),
        };

        Ok(Self {
            verbose: args.verbose,
            path: args.path,
            suffix: args.suffix,
            port,
            interfaces,
            title: args
                .title
                .unwrap_or_else(|| "WireGuard Configuration Manager".to_string()),
            healthcheck_route: "/__confserve_internal/healthcheck".to_string(),
            security,
        })
    }

    /// Registry over the configured directory
    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(&self.path, &self.suffix)
    }
}

#[cfg(test)]
#[path = "config/tests.rs"]
mod tests;
