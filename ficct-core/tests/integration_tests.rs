//! Integration tests for ficct-core infrastructure

use ficct_core::{
    auth_error, config_error, init_logging, log_operation_error, log_operation_start,
    log_operation_success, performance, FicctConfig, FicctError, LogFormat, LoggingConfig,
    StorageBackend,
};

#[tokio::test]
async fn test_logging_and_operation_macros() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        log_span_timings: false,
        log_file_path: None,
        filter_directives: vec!["ficct_core=debug".to_string()],
    };

    // A second subscriber in the same test binary is rejected, so the
    // outcome is not asserted.
    let _ = init_logging(&config);

    log_operation_start!("load_dashboard");
    log_operation_success!("load_dashboard", requests = 4);
    log_operation_error!("load_dashboard", "connection refused", endpoint = "/docentes");

    let value = performance::measure_async("noop", async { 41 + 1 }).await;
    assert_eq!(value, 42);
}

#[test]
fn test_invalid_filter_directive_is_reported() {
    let config = LoggingConfig {
        filter_directives: vec!["[not a directive".to_string()],
        ..LoggingConfig::default()
    };
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_config_file_with_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ficct.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "https://ficct.example.edu/api"
timeout_seconds = 10

[session]
backend = "memory"

[logging]
level = "warn"
format = "json"
"#,
    )
    .unwrap();

    let config = FicctConfig::from_file(&path).unwrap();
    assert_eq!(config.api.timeout_seconds, 10);
    assert_eq!(config.session.backend, StorageBackend::Memory);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_config_file_is_config_error() {
    let result = FicctConfig::from_file("/definitely/not/here/ficct.toml");
    match result {
        Err(FicctError::Config { context, .. }) => {
            assert_eq!(context.operation.as_deref(), Some("read_file"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_error_macros_suggest_cli_commands() {
    let error = config_error!("missing base url", "test");
    let suggestions = &error.context().unwrap().recovery_suggestions;
    assert!(suggestions.iter().any(|s| s.contains("ficct config --init")));

    let error = auth_error!("no token", "test");
    assert!(error.to_string().contains("no token"));
}

#[test]
fn test_measure_async_outside_a_runtime() {
    let measured = tokio_test::block_on(performance::measure_async("parse_config", async {
        toml_roundtrip_timeout(45)
    }));
    assert_eq!(measured, 45);
}

fn toml_roundtrip_timeout(timeout: u64) -> u64 {
    let mut config = FicctConfig::default();
    config.api.timeout_seconds = timeout;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ficct.toml");
    config.save_to_file(&path).unwrap();
    FicctConfig::from_file(&path).unwrap().api.timeout_seconds
}
