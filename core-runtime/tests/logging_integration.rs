//! Integration tests for logging helpers

use bridge_traits::time::LogLevel;
use core_runtime::logging::{redact_if_sensitive, strip_path, LogFormat, LoggingConfig};

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("provider_sharepoint=debug,core_auth=trace")
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(
        config.filter.as_deref(),
        Some("provider_sharepoint=debug,core_auth=trace")
    );
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("access_token", "eyJ0eXAi"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer eyJ"), "[REDACTED]");
}

#[test]
fn test_identifiers_pass_through() {
    assert_eq!(redact_if_sensitive("client_id", "4f1c-app"), "4f1c-app");
    assert_eq!(redact_if_sensitive("tenant_id", "contoso"), "contoso");
    assert_eq!(redact_if_sensitive("drive_id", "b!abc"), "b!abc");
}

#[test]
fn test_owner_emails_are_masked() {
    let redacted = redact_if_sensitive("owner", "adele@contoso.com");
    assert!(redacted.starts_with('a'));
    assert!(!redacted.contains("contoso.com"));
}

#[test]
fn test_drive_paths_are_stripped() {
    assert_eq!(strip_path("Shared/Reports/2024/q1.xlsx"), "q1.xlsx");
    assert_eq!(strip_path("Reports\\q1.xlsx"), "q1.xlsx");
    assert_eq!(strip_path("q1.xlsx"), "q1.xlsx");
    assert_eq!(strip_path("Shared/Reports/"), "");
}
