use std::env;

use bandsync::config::Config;
use pretty_assertions::assert_eq;
use serial_test::serial;

mod common;

const KEYS: [&str; 11] = [
    "DATABASE_URL",
    "SERVICE_DATABASE_URL",
    "JWT_SECRET",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "CRON_SECRET",
    "PUSH_GATEWAY_URL",
    "REMINDER_INTERVAL_HOURS",
    "REMINDER_WINDOW_HOURS",
    "RUN_REMINDER_LOOP",
];

/// Runs `f` with `KEYS` cleared and restores the previous environment afterwards.
fn with_clean_env(f: impl FnOnce()) {
    common::setup_test_env();
    let saved: Vec<(&str, Option<String>)> = KEYS.iter().map(|k| (*k, env::var(k).ok())).collect();
    for key in KEYS {
        unsafe { env::remove_var(key) };
    }

    f();

    for (key, value) in saved {
        match value {
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
    }
}

#[test]
#[serial]
fn test_config_from_env_with_defaults() {
    with_clean_env(|| {
        let config = Config::from_env_only().unwrap();

        assert_eq!(config.database_url, "postgres://@localhost:5432/bandsync");
        assert_eq!(config.service_database_url, config.database_url);
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.cron_secret, None);
        assert_eq!(config.push_gateway_url, None);
        assert_eq!(config.reminder_interval_hours, 6);
        assert_eq!(config.reminder_window_hours, 24);
        assert!(!config.run_reminder_loop);
        assert!(!config.is_production());
    });
}

#[test]
#[serial]
fn test_config_from_env_with_custom_values() {
    with_clean_env(|| {
        unsafe {
            env::set_var("DATABASE_URL", "postgres://app@db/bandsync");
            env::set_var("SERVICE_DATABASE_URL", "postgres://service@db/bandsync");
            env::set_var("PORT", "9090");
            env::set_var("ENVIRONMENT", "production");
            env::set_var("CRON_SECRET", "s3cret");
            env::set_var("PUSH_GATEWAY_URL", "https://push.example.com/send");
            env::set_var("REMINDER_WINDOW_HOURS", "48");
            env::set_var("RUN_REMINDER_LOOP", "TRUE");
        }

        let config = Config::from_env_only().unwrap();

        assert_eq!(config.service_database_url, "postgres://service@db/bandsync");
        assert_eq!(config.server_address(), "127.0.0.1:9090");
        assert_eq!(config.cron_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            config.push_gateway_url.as_deref(),
            Some("https://push.example.com/send")
        );
        assert_eq!(config.reminder_window_hours, 48);
        assert!(config.run_reminder_loop);
        assert!(config.is_production());
    });
}

#[test]
#[serial]
fn test_blank_secrets_are_treated_as_unset() {
    with_clean_env(|| {
        unsafe {
            env::set_var("CRON_SECRET", "   ");
            env::set_var("PORT", "not-a-port");
        }

        let config = Config::from_env_only().unwrap();

        assert_eq!(config.cron_secret, None);
        assert_eq!(config.port, 8080);
    });
}
