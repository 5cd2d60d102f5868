//! Session configuration: rc file overlaid by environment, overridden per run.

use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .dvizrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Build a config from explicit pairs on top of the defaults, ignoring the
    /// environment. Used by tests and anywhere a fully pinned config is needed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = default_map();
        map.extend(pairs);
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Per-run override, e.g. from a CLI flag.
    pub fn set(&mut self, key: &str, value: String) {
        self.inner.insert(key.to_string(), value);
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "LLM_API_KEY",
        "LLM_API_BASE",
        "SANDBOX_API_KEY",
        "SANDBOX_API_BASE",
        "DEFAULT_MODEL",
        "REQUEST_TIMEOUT",
        "SHOW_FULL_DATASET",
        "PRETTIFY_MARKDOWN",
    ];

    KEYS.contains(&k) || k.starts_with("DVIZ_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("dviz").join(".dvizrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("LLM_API_BASE".into(), "https://api.siliconflow.cn/v1".into());
    m.insert("SANDBOX_API_BASE".into(), "https://api.e2b.dev".into());
    m.insert("DEFAULT_MODEL".into(), "Qwen/Qwen2.5-7B-Instruct".into());
    m.insert("REQUEST_TIMEOUT".into(), "120".into());

    // Bools as strings
    m.insert("SHOW_FULL_DATASET".into(), "false".into());
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_present() {
        let cfg = Config::from_pairs([]);
        assert_eq!(cfg.get("DEFAULT_MODEL").as_deref(), Some("Qwen/Qwen2.5-7B-Instruct"));
        assert!(!cfg.get_bool("SHOW_FULL_DATASET"));
        assert!(cfg.get_bool("PRETTIFY_MARKDOWN"));
        assert!(cfg.get("LLM_API_KEY").is_none());
    }

    #[test]
    fn set_overrides_default() {
        let mut cfg = Config::from_pairs([]);
        cfg.set("DEFAULT_MODEL", "THUDM/glm-4-9b-chat".into());
        assert_eq!(cfg.get("DEFAULT_MODEL").as_deref(), Some("THUDM/glm-4-9b-chat"));
    }
}
