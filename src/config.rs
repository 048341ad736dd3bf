use std::path::{Path, PathBuf};

use crate::db::DEFAULT_SESSION_SIZE;

const DEFAULT_DB_NAME: &str = "flashdeck.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub user: String,
    pub session_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Builds the config from a variable lookup, falling back to defaults.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("FLASHDECK_DB")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let user = lookup("FLASHDECK_USER")
            .or_else(|| lookup("USER"))
            .unwrap_or_else(|| String::from("local"));

        let session_size = match lookup("FLASHDECK_SESSION_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    log::warn!(
                        "ignoring FLASHDECK_SESSION_SIZE={:?}, using {}",
                        raw,
                        DEFAULT_SESSION_SIZE
                    );
                    DEFAULT_SESSION_SIZE
                }
            },
            None => DEFAULT_SESSION_SIZE,
        };

        Self {
            db_path,
            user,
            session_size,
        }
    }
}

fn default_db_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashdeck");

    ensure_dir(&config_dir);
    config_dir.join(DEFAULT_DB_NAME)
}

fn ensure_dir(dir: &Path) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("could not create {}: {}", dir.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::resolve(lookup(&[
            ("FLASHDECK_DB", "/tmp/test_flashdeck.db"),
            ("FLASHDECK_USER", "alice"),
            ("USER", "root"),
            ("FLASHDECK_SESSION_SIZE", "5"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/test_flashdeck.db"));
        assert_eq!(config.user, "alice");
        assert_eq!(config.session_size, 5);
    }

    #[test]
    fn user_falls_back_to_login_then_local() {
        assert_eq!(Config::resolve(lookup(&[("USER", "bob")])).user, "bob");
        assert_eq!(Config::resolve(lookup(&[])).user, "local");
    }

    #[test]
    fn default_db_path_ends_with_db_name() {
        let config = Config::resolve(lookup(&[]));
        let path = config.db_path.to_str().unwrap();
        assert!(path.ends_with("flashdeck.db"));
        assert!(path.contains("flashdeck"));
    }

    #[test]
    fn ensure_dir_reports_failure() {
        let base = std::env::temp_dir().join(format!("flashdeck-config-{}", std::process::id()));
        assert!(ensure_dir(&base));
        assert!(ensure_dir(&base));

        let file = base.join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(!ensure_dir(&file.join("nested")));

        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn bad_session_size_uses_default() {
        for raw in ["0", "-3", "many", ""] {
            let config = Config::resolve(lookup(&[("FLASHDECK_SESSION_SIZE", raw)]));
            assert_eq!(config.session_size, DEFAULT_SESSION_SIZE, "{:?}", raw);
        }
    }
}
