//! Tests for the configuration validation system

use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

use crate::{
    args::CliArgs,
    config::{ConfServeConfig, ConfServeConfigValidator, ConfigValidator},
    errors::ConfigValidationError,
};

/// Helper function to create a CliArgs pointing at `path` with defaults
fn create_default_args(path: PathBuf) -> CliArgs {
    CliArgs {
        verbose: false,
        path,
        suffix: ".conf".to_string(),
        port: 0,
        interfaces: vec![],
        title: None,
        security_headers: false,
        csp: None,
        rate_limit: false,
        rate_limit_requests: 60,
        rate_limit_window: 60,
        max_request_size: 1024 * 1024,
    }
}

mod port_validation_tests {
    use super::*;

    #[test]
    fn test_validate_port_zero_success() {
        let validator = ConfServeConfigValidator;
        assert!(validator.validate_port(0).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_port_privileged_error() {
        let validator = ConfServeConfigValidator;
        match validator.validate_port(80) {
            Err(ConfigValidationError::PortError { port, suggestion }) => {
                assert_eq!(port, 80);
                assert!(suggestion.contains("privileged port"));
            }
            other => panic!("Expected PortError for privileged port, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_port_in_use() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let validator = ConfServeConfigValidator;
        assert!(matches!(
            validator.validate_port(port),
            Err(ConfigValidationError::PortError { .. })
        ));
    }
}

mod path_validation_tests {
    use super::*;

    #[test]
    fn test_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let args = create_default_args(temp_dir.path().to_path_buf());
        assert!(ConfServeConfigValidator.validate_paths(&args).is_ok());
    }

    #[test]
    fn test_nonexistent_path() {
        let args = create_default_args(PathBuf::from("/nonexistent/confserve/path"));
        match ConfServeConfigValidator.validate_paths(&args) {
            Err(errors) => {
                assert_eq!(errors.len(), 1);
                match &errors[0] {
                    ConfigValidationError::PathError {
                        path,
                        reason,
                        suggestion,
                    } => {
                        assert!(path.contains("nonexistent"));
                        assert_eq!(reason, "Path does not exist");
                        assert!(suggestion.contains("mkdir -p"));
                    }
                    other => panic!("Expected PathError, got {other:?}"),
                }
            }
            Ok(()) => panic!("Expected validation to fail"),
        }
    }

    #[test]
    fn test_file_instead_of_directory() {
        let file = NamedTempFile::new().unwrap();
        let args = create_default_args(file.path().to_path_buf());
        match ConfServeConfigValidator.validate_paths(&args) {
            Err(errors) => assert!(errors.iter().any(|e| matches!(e,
                ConfigValidationError::PathError { reason, .. } if reason == "Path is not a directory"
            ))),
            Ok(()) => panic!("Expected validation to fail"),
        }
    }
}

mod suffix_validation_tests {
    use super::*;

    #[test]
    fn test_plain_suffixes_accepted() {
        for suffix in [".conf", ".wg", ""] {
            assert!(ConfServeConfigValidator.validate_suffix(suffix).is_ok());
        }
    }

    #[test]
    fn test_suffix_with_separator_rejected() {
        assert!(matches!(
            ConfServeConfigValidator.validate_suffix("/x.conf"),
            Err(ConfigValidationError::SuffixError { .. })
        ));
    }
}

mod security_validation_tests {
    use super::*;

    #[test]
    fn test_zero_rate_limit_values() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.rate_limit = true;
        args.rate_limit_requests = 0;
        args.rate_limit_window = 0;

        match ConfServeConfigValidator.validate_security_config(&args) {
            Err(errors) => assert_eq!(errors.len(), 2),
            Ok(()) => panic!("Expected validation to fail"),
        }
    }

    #[test]
    fn test_zero_rate_limit_ignored_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.rate_limit_requests = 0;
        assert!(ConfServeConfigValidator.validate_security_config(&args).is_ok());
    }

    #[test]
    fn test_zero_request_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.max_request_size = 0;
        assert!(ConfServeConfigValidator.validate_security_config(&args).is_err());
    }

    #[test]
    fn test_csp_with_newline() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.security_headers = true;
        args.csp = Some("default-src 'self'\nscript-src 'none'".to_string());
        assert!(ConfServeConfigValidator.validate_security_config(&args).is_err());
    }
}

mod config_building_tests {
    use super::*;

    #[test]
    fn test_try_from_args_success() {
        let temp_dir = TempDir::new().unwrap();
        let args = create_default_args(temp_dir.path().to_path_buf());

        let config = ConfServeConfig::try_from_args(args).unwrap();
        assert!(config.port > 0);
        assert_eq!(config.path, temp_dir.path());
        assert_eq!(config.interfaces.len(), 2);
        assert_eq!(config.title, "WireGuard Configuration Manager");
        assert!(!config.security.enable_rate_limiting);
        assert_eq!(config.store().base_dir(), temp_dir.path());
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let args = create_default_args(PathBuf::from("/nonexistent/confserve/path"));
        assert!(ConfServeConfig::try_from_args(args).is_ok());
    }

    #[test]
    fn test_security_error_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.max_request_size = 0;

        let err = ConfServeConfig::try_from_args(args).unwrap_err();
        assert!(err.to_string().contains("--max-request-size"));
    }

    #[test]
    fn test_security_settings_carried_over() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = create_default_args(temp_dir.path().to_path_buf());
        args.security_headers = true;
        args.csp = Some("default-src 'none'".to_string());
        args.rate_limit = true;
        args.rate_limit_requests = 5;
        args.rate_limit_window = 10;
        args.title = Some("Office VPN".to_string());

        let config = ConfServeConfig::try_from_args(args).unwrap();
        assert!(config.security.enable_security_headers);
        assert_eq!(config.security.csp, "default-src 'none'");
        assert_eq!(config.security.rate_limit_config.max_requests, 5);
        assert_eq!(config.security.rate_limit_config.window_size, 10);
        assert_eq!(config.title, "Office VPN");
    }
}
