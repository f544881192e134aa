use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use flowsnap_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source_of = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = [
        (
            "warehouse.url",
            config.warehouse.url.clone(),
            source_of("warehouse.url", &["FLOWSNAP_WAREHOUSE_URL"]),
        ),
        (
            "warehouse.namespace",
            config.warehouse.namespace.clone(),
            source_of("warehouse.namespace", &["FLOWSNAP_WAREHOUSE_NAMESPACE"]),
        ),
        (
            "warehouse.max_connections",
            config.warehouse.max_connections.to_string(),
            source_of("warehouse.max_connections", &["FLOWSNAP_WAREHOUSE_MAX_CONNECTIONS"]),
        ),
        (
            "warehouse.timeout_secs",
            config.warehouse.timeout_secs.to_string(),
            source_of("warehouse.timeout_secs", &["FLOWSNAP_WAREHOUSE_TIMEOUT_SECS"]),
        ),
        (
            "source.snapshot_dir",
            config.source.snapshot_dir.display().to_string(),
            source_of("source.snapshot_dir", &["FLOWSNAP_SOURCE_SNAPSHOT_DIR"]),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source_of("logging.level", &["FLOWSNAP_LOGGING_LEVEL", "FLOWSNAP_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            source_of("logging.format", &["FLOWSNAP_LOGGING_FORMAT", "FLOWSNAP_LOG_FORMAT"]),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|(key, value, source)| render_line(key, value, source)));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("flowsnap.toml"), PathBuf::from("config/flowsnap.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source, render_line};

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc: toml::Value =
            "[warehouse]\nnamespace = \"agent_structure\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "warehouse.namespace"));
        assert!(!contains_path(&doc, "warehouse.url"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn file_attribution_names_the_file() {
        let doc: toml::Value = "[source]\nsnapshot_dir = \"snaps\"\n".parse().expect("toml");
        let source = field_source(
            "source.snapshot_dir",
            &["FLOWSNAP_TEST_UNSET_KEY"],
            Some(&doc),
            Some(std::path::Path::new("flowsnap.toml")),
        );
        assert_eq!(source, "file (flowsnap.toml)");
        assert_eq!(
            render_line("source.snapshot_dir", "snaps", &source),
            "- source.snapshot_dir = snaps (source: file (flowsnap.toml))"
        );
    }
}
