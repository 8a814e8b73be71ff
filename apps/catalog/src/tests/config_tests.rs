use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("catalog_settings_test_{suffix}.toml"));
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_match_the_catalog_api() {
    let settings = Settings::default();
    assert_eq!(settings.api_base_url, "http://localhost:5000");
    assert_eq!(settings.query_state(), QueryState::default());
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
api_base_url = "http://books.internal:8080"
page_size = 24
sort_by = "title"
order = "desc"
request_timeout_secs = 10
"#,
    );

    let settings = load_settings_with(Some(path.clone()), env_of(&[]));

    assert_eq!(settings.api_base_url, "http://books.internal:8080");
    assert_eq!(settings.page_size, 24);
    assert_eq!(settings.sort_by, SortKey::Title);
    assert_eq!(settings.order, SortOrder::Desc);
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(10)));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn environment_overrides_file() {
    let path = temp_config("api_base_url = \"http://from-file\"\npage_size = 24\n");

    let settings = load_settings_with(
        Some(path.clone()),
        env_of(&[
            ("CATALOG_API_URL", "http://from-env"),
            ("APP__PAGE_SIZE", "6"),
            ("APP__ORDER", "descending"),
        ]),
    );

    assert_eq!(settings.api_base_url, "http://from-env");
    assert_eq!(settings.page_size, 6);
    assert_eq!(settings.order, SortOrder::Desc);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn invalid_values_keep_previous_layer() {
    let settings = load_settings_with(
        Some(PathBuf::from("/nonexistent/catalog.toml")),
        env_of(&[
            ("APP__PAGE_SIZE", "0"),
            ("APP__SORT_BY", "isbn"),
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
        ]),
    );

    assert_eq!(settings, Settings::default());
}

#[test]
fn malformed_file_is_ignored() {
    let path = temp_config("page_size = \"twelve\"");

    let settings = load_settings_with(Some(path.clone()), env_of(&[]));

    assert_eq!(settings, Settings::default());
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn config_path_prefers_explicit_then_env() {
    let lookup = env_of(&[("CATALOG_CONFIG", "/etc/catalog.toml")]);
    assert_eq!(
        config_path(Some(PathBuf::from("local.toml")), &lookup),
        PathBuf::from("local.toml")
    );
    assert_eq!(
        config_path(None, &lookup),
        PathBuf::from("/etc/catalog.toml")
    );
    assert_eq!(
        config_path(None, &env_of(&[])),
        PathBuf::from(DEFAULT_CONFIG_PATH)
    );
}

#[test]
fn zero_timeout_means_unbounded() {
    let settings = Settings {
        request_timeout_secs: Some(0),
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), None);
}
