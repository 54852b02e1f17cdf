// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydesk::config::Config;
use moneydesk::error::ConfigError;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn empty_yaml_gives_defaults() {
    let c = Config::from_yaml_str("", "inline").unwrap();
    assert_eq!(c.dashboard.page_size, 10);
    assert_eq!(c.dashboard.poll_interval_secs, 5);
    assert!(c.dashboard.realtime);
    assert_eq!(c.logging.level, "info");
    assert_eq!(c.poll_interval(), Duration::from_secs(5));
    assert!(c.store.url.is_none());
}

#[test]
fn yaml_sections_are_read() {
    let raw = r#"
store:
  url: https://abc.supabase.co
  anon_key: anon
dashboard:
  page_size: 25
  realtime: false
logging:
  level: debug
"#;
    let c = Config::from_yaml_str(raw, "inline").unwrap();
    assert_eq!(c.dashboard.page_size, 25);
    assert_eq!(c.dashboard.poll_interval_secs, 5);
    assert!(!c.dashboard.realtime);
    assert_eq!(c.logging.level, "debug");
    let creds = c.credentials().unwrap();
    assert_eq!(creds.url, "https://abc.supabase.co");
    assert_eq!(creds.anon_key, "anon");
    assert_eq!(creds.service_key, None);
}

#[test]
fn broken_yaml_is_reported() {
    let err = Config::from_yaml_str("dashboard: [", "inline").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml { .. }));
}

#[test]
fn environment_overrides_file() {
    let mut c = Config::from_yaml_str("store:\n  url: https://file.example\n", "inline").unwrap();
    c.apply_env_from(env(&[
        ("SUPABASE_URL", "https://env.example"),
        ("REACT_APP_SUPABASE_ANON_KEY", "legacy-anon"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service"),
    ]));
    let creds = c.credentials().unwrap();
    assert_eq!(creds.url, "https://env.example");
    assert_eq!(creds.anon_key, "legacy-anon");
    assert_eq!(creds.service_key.as_deref(), Some("service"));
}

#[test]
fn empty_environment_values_are_ignored() {
    let mut c = Config::from_yaml_str("store:\n  url: https://file.example\n", "inline").unwrap();
    c.apply_env_from(env(&[("SUPABASE_URL", "  "), ("SUPABASE_ANON_KEY", "k")]));
    assert_eq!(c.credentials().unwrap().url, "https://file.example");
}

#[test]
fn missing_credentials_name_the_setting() {
    let c = Config::default();
    match c.credentials() {
        Err(ConfigError::Missing { field, env }) => {
            assert_eq!(field, "store.url");
            assert_eq!(env, "SUPABASE_URL");
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut c = Config::default();
    c.apply_env_from(env(&[("SUPABASE_URL", "https://x.example")]));
    assert!(matches!(
        c.credentials(),
        Err(ConfigError::Missing {
            field: "store.anon_key",
            ..
        })
    ));
}

#[test]
fn non_http_url_is_invalid() {
    let mut c = Config::default();
    c.apply_env_from(env(&[("SUPABASE_URL", "abc.supabase.co"), ("SUPABASE_ANON_KEY", "k")]));
    assert!(matches!(c.credentials(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn zero_page_size_fails_validation() {
    let c = Config::from_yaml_str("dashboard:\n  page_size: 0\n", "inline").unwrap();
    assert!(matches!(c.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn load_reads_given_file() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "dashboard:\n  page_size: 3\n  poll_interval_secs: 30").unwrap();
    let c = Config::load(Some(f.path())).unwrap();
    assert_eq!(c.dashboard.page_size, 3);
    assert_eq!(c.poll_interval(), Duration::from_secs(30));
}

#[test]
fn load_of_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn invalid_file_falls_back_but_keeps_environment() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "dashboard:\n  page_size: 0").unwrap();
    let (c, err) = Config::load_or_default(
        Some(f.path()),
        env(&[("SUPABASE_URL", "https://env.example"), ("SUPABASE_ANON_KEY", "anon")]),
    );
    assert!(matches!(err, Some(ConfigError::Invalid { field: "dashboard.page_size", .. })));
    assert_eq!(c.dashboard.page_size, 10);
    let creds = c.credentials().unwrap();
    assert_eq!(creds.url, "https://env.example");
    assert_eq!(creds.anon_key, "anon");
}

#[test]
fn good_file_loads_without_error() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "dashboard:\n  page_size: 4").unwrap();
    let (c, err) = Config::load_or_default(Some(f.path()), env(&[]));
    assert!(err.is_none());
    assert_eq!(c.dashboard.page_size, 4);
}
