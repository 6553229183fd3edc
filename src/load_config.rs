/// `load_config` module: loads the static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed and mapped onto typed structs.
///
/// # Responsibilities
/// - Parse the YAML file into [`AppConfig`]
/// - Inject `SUPABASE_URL` / `SUPABASE_KEY` from the environment when Supabase storage is selected
/// - Produce `anyhow` errors naming the file or variable that was wrong
///
/// Accepted schema:
///
/// ```yaml
/// data_dir: ./data
/// storage:
///   type: local            # or: supabase
///   dir: ./data/artifacts
///   public_base_url: null
/// ```
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding the JSON document collections.
    pub data_dir: PathBuf,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Local {
        dir: PathBuf,
        public_base_url: Option<String>,
    },
    Supabase(SupabaseConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    data_dir: PathBuf,
    storage: StorageSection,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
enum StorageSection {
    Local {
        dir: Option<PathBuf>,
        #[serde(default)]
        public_base_url: Option<String>,
    },
    Supabase {
        #[serde(default = "default_bucket")]
        bucket: String,
    },
}

fn default_bucket() -> String {
    "pdf".to_string()
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path_ref)
    })?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");

    let storage = match raw.storage {
        StorageSection::Local {
            dir,
            public_base_url,
        } => StorageConfig::Local {
            dir: dir.unwrap_or_else(|| raw.data_dir.join("artifacts")),
            public_base_url,
        },
        StorageSection::Supabase { bucket } => {
            if bucket.trim().is_empty() {
                bail!("storage.bucket must not be empty");
            }
            StorageConfig::Supabase(SupabaseConfig {
                url: required_env(SUPABASE_URL_VAR)?
                    .trim_end_matches('/')
                    .to_string(),
                key: required_env(SUPABASE_KEY_VAR)?,
                bucket,
            })
        }
    };

    let config = AppConfig {
        data_dir: raw.data_dir,
        storage,
    };
    info!(
        data_dir = %config.data_dir.display(),
        storage = config.storage.kind(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Local { .. } => "local",
            StorageConfig::Supabase(_) => "supabase",
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|e| {
            error!(error = ?e, var = name, "Required environment variable not set");
            e
        })
        .with_context(|| format!("{name} environment variable not set"))?;
    if value.trim().is_empty() {
        error!(var = name, "Required environment variable is empty");
        bail!("{name} environment variable is empty");
    }
    Ok(value)
}
