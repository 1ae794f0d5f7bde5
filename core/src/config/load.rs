use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Default krawler data directory: ~/.krawler
pub fn get_krawler_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".krawler"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.krawler/config.toml
    let user_config = get_krawler_data_dir()?.join("config.toml");

    // Priority 2: ./krawler.toml
    let local_config = Path::new("krawler.toml");

    let cfg = if user_config.exists() {
        read_file(&user_config)?
    } else if local_config.exists() {
        read_file(local_config)?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(cfg)
}

/// Load an explicit config file; environment overrides still apply.
pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    apply_env_overrides(read_file(path)?)
}

fn read_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

fn apply_env_overrides(mut cfg: AppConfig) -> anyhow::Result<AppConfig> {
    if let Ok(v) = std::env::var("KRAWLER_WORKERS_LIMIT") {
        if !v.trim().is_empty() {
            cfg.engine.workers_limit = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("KRAWLER_WORKERS_LIMIT must be a positive integer, got '{v}'"))?;
        }
    }
    if let Ok(v) = std::env::var("KRAWLER_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    Ok(cfg)
}
