//! Configuration loading from environment variables.

use crate::bookmark::ResumePolicy;
use crate::constants::{
    DEFAULT_BOOKMARK_FILE_NAME, DEFAULT_CACHE_SIZE_BYTES, DEFAULT_PAGE_SIZE,
    DEFAULT_PATCH_HEIGHT, DEFAULT_PATCH_WIDTH,
};
use crate::db::DatasetOptions;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for patchlabel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bookmark_path: PathBuf,
    pub cache_size_bytes: usize,
    pub page_size: usize,
    pub patch_width: u32,
    pub patch_height: u32,
    pub legacy_resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookmark_path: PathBuf::from(DEFAULT_BOOKMARK_FILE_NAME),
            cache_size_bytes: DEFAULT_CACHE_SIZE_BYTES,
            page_size: DEFAULT_PAGE_SIZE,
            patch_width: DEFAULT_PATCH_WIDTH,
            patch_height: DEFAULT_PATCH_HEIGHT,
            legacy_resume: false,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a strictly positive numeric setting.
fn parse_positive<T>(value: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|parsed| *parsed != T::default())
}

fn env_positive<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Default + PartialEq,
{
    match env::var(name) {
        Ok(raw) => parse_positive(&raw).unwrap_or_else(|| {
            tracing::warn!("Ignoring invalid {}={:?}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or invalid.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bookmark_path: env::var("PATCHLABEL_BOOKMARK")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(|value| PathBuf::from(expand_tilde(value)))
                .unwrap_or(defaults.bookmark_path),
            cache_size_bytes: env_positive("PATCHLABEL_CACHE_BYTES", defaults.cache_size_bytes),
            page_size: env_positive("PATCHLABEL_PAGE_SIZE", defaults.page_size),
            patch_width: env_positive("PATCHLABEL_PATCH_WIDTH", defaults.patch_width),
            patch_height: env_positive("PATCHLABEL_PATCH_HEIGHT", defaults.patch_height),
            legacy_resume: env::var("PATCHLABEL_LEGACY_RESUME")
                .ok()
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(false),
        }
    }

    /// Options used for every dataset connection.
    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            cache_size_bytes: self.cache_size_bytes,
        }
    }

    /// Bookmark resume policy selected by `legacy_resume`.
    pub fn resume_policy(&self) -> ResumePolicy {
        if self.legacy_resume {
            ResumePolicy::LegacyNearEnd
        } else {
            ResumePolicy::Exact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const VARS: [&str; 6] = [
        "PATCHLABEL_BOOKMARK",
        "PATCHLABEL_CACHE_BYTES",
        "PATCHLABEL_PAGE_SIZE",
        "PATCHLABEL_PATCH_WIDTH",
        "PATCHLABEL_PATCH_HEIGHT",
        "PATCHLABEL_LEGACY_RESUME",
    ];

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    /// Clears the config variables, applies `pairs`, and restores on drop.
    struct ScopedEnv {
        previous: Vec<(&'static str, Option<String>)>,
    }

    impl ScopedEnv {
        #[allow(unused_unsafe)]
        fn new(pairs: &[(&'static str, &str)]) -> Self {
            let previous = VARS.iter().map(|key| (*key, env::var(key).ok())).collect();
            // SAFETY: config tests serialize env mutation through `env_lock`.
            unsafe {
                for key in VARS {
                    env::remove_var(key);
                }
                for (key, value) in pairs {
                    env::set_var(key, value);
                }
            }
            Self { previous }
        }
    }

    impl Drop for ScopedEnv {
        #[allow(unused_unsafe)]
        fn drop(&mut self) {
            // SAFETY: see `ScopedEnv::new`.
            unsafe {
                for (key, value) in &self.previous {
                    match value {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn parse_positive_rejects_zero_and_garbage() {
        assert_eq!(parse_positive::<usize>(" 12 "), Some(12));
        assert_eq!(parse_positive::<usize>("0"), None);
        assert_eq!(parse_positive::<u32>("-4"), None);
        assert_eq!(parse_positive::<u32>("wide"), None);
    }

    #[test]
    fn from_env_uses_defaults_when_unset() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = ScopedEnv::new(&[]);
        let config = Config::from_env();
        assert_eq!(config, Config::default());
        assert_eq!(config.bookmark_path, PathBuf::from(".bookmark"));
        assert_eq!(config.page_size, 6);
        assert_eq!(config.resume_policy(), ResumePolicy::Exact);
    }

    #[test]
    fn from_env_reads_overrides() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = ScopedEnv::new(&[
            ("PATCHLABEL_BOOKMARK", "/tmp/patchlabel/.bookmark"),
            ("PATCHLABEL_CACHE_BYTES", "4096"),
            ("PATCHLABEL_PAGE_SIZE", "10"),
            ("PATCHLABEL_PATCH_WIDTH", "256"),
            ("PATCHLABEL_PATCH_HEIGHT", "64"),
            ("PATCHLABEL_LEGACY_RESUME", "yes"),
        ]);
        let config = Config::from_env();
        assert_eq!(
            config.bookmark_path,
            PathBuf::from("/tmp/patchlabel/.bookmark")
        );
        assert_eq!(config.dataset_options().cache_size_bytes, 4096);
        assert_eq!(config.page_size, 10);
        assert_eq!((config.patch_width, config.patch_height), (256, 64));
        assert_eq!(config.resume_policy(), ResumePolicy::LegacyNearEnd);
    }

    #[test]
    fn from_env_ignores_invalid_numbers() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = ScopedEnv::new(&[
            ("PATCHLABEL_PAGE_SIZE", "0"),
            ("PATCHLABEL_CACHE_BYTES", "huge"),
            ("PATCHLABEL_LEGACY_RESUME", "perhaps"),
        ]);
        let config = Config::from_env();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache_size_bytes, DEFAULT_CACHE_SIZE_BYTES);
        assert!(!config.legacy_resume);
    }

    #[test]
    fn bookmark_tilde_expands_to_home() {
        let _lock = env_lock().lock().expect("env lock");
        let _env = ScopedEnv::new(&[("PATCHLABEL_BOOKMARK", "~/labels/.bookmark")]);
        let config = Config::from_env();
        if let Some(home) = resolve_home_dir() {
            assert_eq!(config.bookmark_path, home.join("labels").join(".bookmark"));
        }
    }
}
