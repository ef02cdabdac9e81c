//! # Configuration
//!
//! A minimal string key/value store. Values are set with dotted keys
//! (`chunk.size`, `images.table`) and read back through a typed snapshot.
//!
//! ## Setting and reading values
//! ```rust
//! use shard_core::ShardConfig;
//! let mut config = ShardConfig::new();
//!
//! config.set("chunk.size", "350000");
//! config.set("owner.default", "anonymous");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_usize("chunk.size"), Some(350_000));
//! ```
//!
//! ## Environment
//! [`ShardConfig::from_env`] reads the plain variables the deployment has
//! always used (`IMAGES_TABLE`, `CHUNK_SIZE`, ...) and then applies prefixed
//! overrides, where `SHARD__CHUNK__SIZE=1024` becomes `chunk.size`.

use std::collections::HashMap;

/// Plain environment variables and the config keys they populate.
/// When two variables map to the same key, the earlier one wins.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("IMAGES_TABLE", "images.table"),
    ("UPLOADS_BUCKET", "uploads.bucket"),
    ("UPLOAD_BUCKET", "uploads.bucket"),
    ("DEFAULT_USER_ID", "owner.default"),
    ("CHUNK_SIZE", "chunk.size"),
    ("PRESIGN_EXPIRES", "presign.expires"),
    ("AWS_REGION", "aws.region"),
    ("AWS_ENDPOINT_URL", "aws.endpoint"),
    ("AWS_MAX_ATTEMPTS", "aws.max_attempts"),
    ("HTTP_HOST", "http.host"),
    ("HTTP_PORT", "http.port"),
    ("INGEST_CONCURRENCY", "ingest.concurrency"),
    ("LOG_LEVEL", "log.level"),
];

#[derive(Debug, Default)]
pub struct ShardConfig {
    values: HashMap<String, String>,
}

impl ShardConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Build a config from the process environment.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Build a config from an explicit list of variables.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut config = Self::new();

        for (var, key) in ENV_KEYS {
            if config.has(key) {
                continue;
            }
            if let Some(value) = vars.get(*var) {
                config.set(*key, value.clone());
            }
        }

        let prefix = format!("{prefix}__");
        for (var, value) in &vars {
            if let Some(stripped) = var.strip_prefix(&prefix) {
                let key = stripped.to_lowercase().replace("__", ".");
                config.set(key, value.clone());
            }
        }

        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> ShardConfigSnapshot {
        ShardConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShardConfigSnapshot {
    map: HashMap<String, String>,
}

impl ShardConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse::<u32>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
