//! Configuration loading.
//!
//! Settings come from `~/.sql-pool-link/config.yaml` (or `--config`), with
//! environment variables layered on top. Secrets are never logged.

use crate::azure::ClientCredentials;
use crate::traits::FileSystem;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const CONFIG_DIR: &str = ".sql-pool-link";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_id: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub access_key: Option<String>,
    pub blob_uri: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("blob_uri", &self.blob_uri)
            .finish()
    }
}

/// Target pricing for the imported database
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub edition: String,
    pub service_objective: String,
    pub max_size_bytes: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            edition: "Standard".to_string(),
            service_objective: "S2".to_string(),
            max_size_bytes: "100".to_string(),
        }
    }
}

/// SKU the database takes once it belongs to the pool
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSkuConfig {
    pub name: String,
    pub tier: String,
}

impl Default for PoolSkuConfig {
    fn default() -> Self {
        Self {
            name: "ElasticPool".to_string(),
            tier: "Standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointsConfig {
    pub authority: String,
    pub management: String,
    pub poll_interval_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            authority: "https://login.microsoftonline.com".to_string(),
            management: "https://management.azure.com".to_string(),
            poll_interval_secs: 5,
        }
    }
}

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub credentials: CredentialsConfig,
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub pool_sku: PoolSkuConfig,
    pub endpoints: EndpointsConfig,
}

/// Values taken from the environment (or matching flags); each wins over the file
#[derive(Clone, Default)]
pub struct Overrides {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_id: Option<String>,
    pub storage_key: Option<String>,
    pub blob_uri: Option<String>,
}

/// Fully resolved settings the workflow runs with
#[derive(Clone)]
pub struct Settings {
    pub credentials: ClientCredentials,
    pub subscription_id: String,
    pub storage_key: String,
    pub blob_uri: Url,
    pub import: ImportConfig,
    pub pool_sku: PoolSkuConfig,
    pub authority: Url,
    pub management: Url,
    pub poll_interval: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("credentials", &self.credentials)
            .field("subscription_id", &self.subscription_id)
            .field("storage_key", &"<redacted>")
            .field("blob_uri", &self.blob_uri.as_str())
            .field("import", &self.import)
            .field("pool_sku", &self.pool_sku)
            .field("authority", &self.authority.as_str())
            .field("management", &self.management.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl AppConfig {
    /// Default config path: `~/.sql-pool-link/config.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path (must exist) or the default path (may be absent)
    pub fn load(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !fs.is_file(path) {
                    bail!("Config file not found: {:?}", path);
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path()?;
                if !fs.is_file(&path) {
                    debug!(path = ?path, "No config file, using defaults and environment");
                    return Ok(Self::default());
                }
                path
            }
        };

        debug!(path = ?path, "Loading config file");
        let content = fs.read_to_string(&path)?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge overrides and check that every required value is present
    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let present = |v: &String| !v.trim().is_empty();
        let pick = |over: Option<String>, file: Option<String>| {
            over.filter(present).or_else(|| file.filter(present))
        };

        let tenant_id = pick(overrides.tenant_id, self.credentials.tenant_id);
        let client_id = pick(overrides.client_id, self.credentials.client_id);
        let client_secret = pick(overrides.client_secret, self.credentials.client_secret);
        let subscription_id = pick(overrides.subscription_id, self.credentials.subscription_id);
        let storage_key = pick(overrides.storage_key, self.storage.access_key);
        let blob_uri = pick(overrides.blob_uri, self.storage.blob_uri);

        let mut missing = Vec::new();
        for (name, value) in [
            ("credentials.tenant_id (AZURE_TENANT_ID)", &tenant_id),
            ("credentials.client_id (AZURE_CLIENT_ID)", &client_id),
            ("credentials.client_secret (AZURE_CLIENT_SECRET)", &client_secret),
            ("credentials.subscription_id (AZURE_SUBSCRIPTION_ID)", &subscription_id),
            ("storage.access_key (AZURE_STORAGE_KEY)", &storage_key),
            ("storage.blob_uri (AZURE_BACPAC_URI)", &blob_uri),
        ] {
            if value.is_none() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            bail!("Missing required configuration: {}", missing.join(", "));
        }

        let (
            Some(tenant_id),
            Some(client_id),
            Some(client_secret),
            Some(subscription_id),
            Some(storage_key),
            Some(blob_uri),
        ) = (tenant_id, client_id, client_secret, subscription_id, storage_key, blob_uri)
        else {
            bail!("Missing required configuration");
        };

        if self.endpoints.poll_interval_secs == 0 {
            bail!("endpoints.poll_interval_secs must be at least 1");
        }

        let blob_uri = parse_url("storage.blob_uri", &blob_uri)?;
        let authority = parse_base_url("endpoints.authority", &self.endpoints.authority)?;
        let management = parse_base_url("endpoints.management", &self.endpoints.management)?;

        Ok(Settings {
            credentials: ClientCredentials {
                tenant_id,
                client_id,
                client_secret,
            },
            subscription_id,
            storage_key,
            blob_uri,
            import: self.import,
            pool_sku: self.pool_sku,
            authority,
            management,
            poll_interval: Duration::from_secs(self.endpoints.poll_interval_secs),
        })
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", key, value))
}

fn parse_base_url(key: &str, value: &str) -> Result<Url> {
    let url = parse_url(key, value)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("{} must be an http(s) URL: {}", key, value);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockFileSystem, RealFileSystem};
    use std::io::Write;

    const FULL_CONFIG: &str = r#"
credentials:
  tenant_id: tenant-1
  client_id: client-1
  client_secret: s3cret
  subscription_id: sub-1
storage:
  access_key: "key=="
  blob_uri: https://acct.blob.core.windows.net/backups/template.bacpac
import:
  service_objective: S3
endpoints:
  poll_interval_secs: 2
"#;

    #[test]
    fn test_parse_full_config_with_defaults() {
        let config = AppConfig::parse(FULL_CONFIG).unwrap();
        assert_eq!(config.credentials.tenant_id.as_deref(), Some("tenant-1"));
        assert_eq!(config.import.edition, "Standard");
        assert_eq!(config.import.service_objective, "S3");
        assert_eq!(config.import.max_size_bytes, "100");
        assert_eq!(config.pool_sku, PoolSkuConfig::default());
        assert_eq!(config.endpoints.management, "https://management.azure.com");
        assert_eq!(config.endpoints.poll_interval_secs, 2);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let result = AppConfig::parse("credentials:\n  tenant: oops\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::parse("\n").unwrap();
        assert!(config.credentials.client_id.is_none());
    }

    #[test]
    fn test_resolve_full_config() {
        let settings = AppConfig::parse(FULL_CONFIG)
            .unwrap()
            .resolve(Overrides::default())
            .unwrap();

        assert_eq!(settings.credentials.tenant_id, "tenant-1");
        assert_eq!(settings.subscription_id, "sub-1");
        assert_eq!(settings.storage_key, "key==");
        assert_eq!(settings.blob_uri.host_str(), Some("acct.blob.core.windows.net"));
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.authority.as_str(), "https://login.microsoftonline.com/");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let overrides = Overrides {
            client_secret: Some("from-env".to_string()),
            subscription_id: Some("sub-env".to_string()),
            ..Default::default()
        };
        let settings = AppConfig::parse(FULL_CONFIG).unwrap().resolve(overrides).unwrap();

        assert_eq!(settings.credentials.client_secret, "from-env");
        assert_eq!(settings.subscription_id, "sub-env");
        assert_eq!(settings.credentials.client_id, "client-1");
    }

    #[test]
    fn test_missing_values_are_all_named() {
        let overrides = Overrides {
            tenant_id: Some("t".to_string()),
            client_id: Some("c".to_string()),
            client_secret: Some("   ".to_string()),
            ..Default::default()
        };
        let err = AppConfig::default().resolve(overrides).unwrap_err().to_string();

        assert!(err.contains("AZURE_CLIENT_SECRET"));
        assert!(err.contains("AZURE_SUBSCRIPTION_ID"));
        assert!(err.contains("AZURE_STORAGE_KEY"));
        assert!(err.contains("AZURE_BACPAC_URI"));
        assert!(!err.contains("AZURE_TENANT_ID"));
    }

    #[test]
    fn test_invalid_blob_uri_is_rejected() {
        let overrides = Overrides {
            tenant_id: Some("t".to_string()),
            client_id: Some("c".to_string()),
            client_secret: Some("s".to_string()),
            subscription_id: Some("sub".to_string()),
            storage_key: Some("k".to_string()),
            blob_uri: Some("not a uri".to_string()),
        };
        let err = AppConfig::default().resolve(overrides).unwrap_err().to_string();
        assert!(err.contains("storage.blob_uri"));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let config = FULL_CONFIG.replace("poll_interval_secs: 2", "poll_interval_secs: 0");
        let err = AppConfig::parse(&config)
            .unwrap()
            .resolve(Overrides::default())
            .unwrap_err()
            .to_string();
        assert!(err.contains("endpoints.poll_interval_secs"));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let fs = MockFileSystem::new();
        let err = AppConfig::load(&fs, Some(Path::new("/etc/nope.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_explicit_file_from_mock() {
        let fs = MockFileSystem::new();
        fs.add_file("/etc/sql-pool-link.yaml", FULL_CONFIG);

        let config = AppConfig::load(&fs, Some(Path::new("/etc/sql-pool-link.yaml"))).unwrap();
        assert_eq!(config.storage.access_key.as_deref(), Some("key=="));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = AppConfig::load(&RealFileSystem, Some(file.path())).unwrap();
        assert_eq!(config.credentials.client_id.as_deref(), Some("client-1"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::parse(FULL_CONFIG).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("key=="));
        assert!(debug.contains("tenant-1"));
    }
}
