//! Server-side configuration file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/tripvisor"
//!
//! [jwt]
//! secret = "..."
//!
//! [social]
//! max_group_members = 1000
//! update_attempts = 8
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory searched for bare context names.
pub const CONFIG_DIR: &str = "/etc/tripvisor";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,

    /// Explicit redb file; defaults to `{data_dir}/data.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared HS256 secret of the identity provider that issues tokens.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSection {
    #[serde(default = "default_max_group_members")]
    pub max_group_members: usize,

    #[serde(default = "default_update_attempts")]
    pub update_attempts: usize,
}

fn default_max_group_members() -> usize {
    social::service::SocialConfig::default().max_group_members
}

fn default_update_attempts() -> usize {
    social::service::SocialConfig::default().update_attempts
}

impl Default for SocialSection {
    fn default() -> Self {
        Self {
            max_group_members: default_max_group_members(),
            update_attempts: default_update_attempts(),
        }
    }
}

impl From<&SocialSection> for social::service::SocialConfig {
    fn from(s: &SocialSection) -> Self {
        Self {
            max_group_members: s.max_group_members,
            update_attempts: s.update_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub social: SocialSection,
}

impl ServerConfig {
    /// A value containing `/` or `.` is a path; anything else is a context
    /// name looked up as `/etc/tripvisor/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Refuse to start on a config that cannot serve requests.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.trim().is_empty() {
            anyhow::bail!("JWT secret is empty in configuration.");
        }
        if self.storage.data_dir.trim().is_empty() {
            anyhow::bail!("Storage data_dir is empty in configuration.");
        }
        if self.social.max_group_members == 0 {
            anyhow::bail!("social.max_group_members must be at least 1.");
        }
        Ok(())
    }
}
