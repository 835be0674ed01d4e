use std::path::Path;

use serde::{Deserialize, Serialize};

use dirconf_crypto::DEFAULT_TENANT_KEY_LEN;
use dirconf_entities::names;
use dirconf_types::Dn;

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_ROOT_DN: &str = "dc=vsphere,dc=local";

/// Settings of a [`ConfigStore`](crate::ConfigStore).
///
/// Every field has a default, so a settings file only needs the values it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigStoreSettings {
    /// Naming context the configuration tree hangs from.
    pub root_dn: Dn,
    pub services_container: String,
    pub identity_manager_container: String,
    pub tenants_container: String,
    /// Length of generated tenant keys.
    pub tenant_key_length: usize,
    pub tenant_defaults: TenantDefaults,
}

impl Default for ConfigStoreSettings {
    fn default() -> Self {
        Self {
            root_dn: Dn::parse(DEFAULT_ROOT_DN).unwrap_or_default(),
            services_container: names::SERVICES.to_string(),
            identity_manager_container: names::IDENTITY_MANAGER.to_string(),
            tenants_container: names::TENANTS.to_string(),
            tenant_key_length: DEFAULT_TENANT_KEY_LEN,
            tenant_defaults: TenantDefaults::default(),
        }
    }
}

impl ConfigStoreSettings {
    /// Defaults rooted at `root_dn`.
    pub fn with_root(root_dn: Dn) -> Self {
        Self {
            root_dn,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let settings: Self =
            toml::from_str(s).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.root_dn.is_root() {
            return Err(ConfigError::InvalidConfig("root_dn must not be empty".into()));
        }
        for (field, name) in [
            ("services_container", &self.services_container),
            ("identity_manager_container", &self.identity_manager_container),
            ("tenants_container", &self.tenants_container),
        ] {
            dirconf_types::names::validate_common_name(name)
                .map_err(|e| ConfigError::InvalidConfig(format!("{field}: {e}")))?;
        }
        if self.tenant_key_length == 0 {
            return Err(ConfigError::InvalidConfig("tenant_key_length must be positive".into()));
        }
        self.tenant_defaults.validate()
    }
}

/// Values reported for tenant properties that were never set.
///
/// Lifetimes and tolerances are in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantDefaults {
    pub clock_tolerance_ms: i64,
    pub delegation_count: i32,
    pub renew_count: i32,
    pub max_bearer_token_lifetime_ms: i64,
    pub max_hok_token_lifetime_ms: i64,
    pub max_bearer_refresh_token_lifetime_ms: i64,
    pub max_hok_refresh_token_lifetime_ms: i64,
}

impl Default for TenantDefaults {
    fn default() -> Self {
        Self {
            clock_tolerance_ms: 600_000,
            delegation_count: 10,
            renew_count: 10,
            max_bearer_token_lifetime_ms: 300_000,
            max_hok_token_lifetime_ms: 2_592_000_000,
            max_bearer_refresh_token_lifetime_ms: 21_600_000,
            max_hok_refresh_token_lifetime_ms: 2_592_000_000,
        }
    }
}

impl TenantDefaults {
    fn validate(&self) -> ConfigResult<()> {
        let longs = [
            ("clock_tolerance_ms", self.clock_tolerance_ms),
            ("max_bearer_token_lifetime_ms", self.max_bearer_token_lifetime_ms),
            ("max_hok_token_lifetime_ms", self.max_hok_token_lifetime_ms),
            ("max_bearer_refresh_token_lifetime_ms", self.max_bearer_refresh_token_lifetime_ms),
            ("max_hok_refresh_token_lifetime_ms", self.max_hok_refresh_token_lifetime_ms),
        ];
        let ints = [
            ("delegation_count", i64::from(self.delegation_count)),
            ("renew_count", i64::from(self.renew_count)),
        ];
        match longs.into_iter().chain(ints).find(|(_, v)| *v < 0) {
            Some((field, _)) => Err(ConfigError::InvalidConfig(format!(
                "tenant_defaults.{field} must not be negative"
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = ConfigStoreSettings::default();
        assert_eq!(s.root_dn, Dn::parse("dc=vsphere,dc=local").unwrap());
        assert_eq!(s.services_container, "Services");
        assert_eq!(s.identity_manager_container, "IdentityManager");
        assert_eq!(s.tenants_container, "Tenants");
        assert_eq!(s.tenant_key_length, 16);
        assert_eq!(s.tenant_defaults.delegation_count, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = ConfigStoreSettings::from_toml_str(
            r#"
            root_dn = "dc=example,dc=com"
            tenant_key_length = 32

            [tenant_defaults]
            clock_tolerance_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(s.root_dn, Dn::parse("dc=example,dc=com").unwrap());
        assert_eq!(s.tenant_key_length, 32);
        assert_eq!(s.tenant_defaults.clock_tolerance_ms, 1000);
        assert_eq!(s.tenant_defaults.renew_count, 10);
        assert_eq!(s.tenants_container, "Tenants");
    }

    #[test]
    fn toml_roundtrip() {
        let s = ConfigStoreSettings::with_root(Dn::parse("dc=corp").unwrap());
        let text = s.to_toml_string().unwrap();
        assert_eq!(ConfigStoreSettings::from_toml_str(&text).unwrap(), s);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ConfigStoreSettings::from_toml_str("tenant_key_length = 0"),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConfigStoreSettings::from_toml_str("[tenant_defaults]\nrenew_count = -1"),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConfigStoreSettings::from_toml_str("tenants_container = \"\""),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConfigStoreSettings::from_toml_str("root_dn = \"\""),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dirconf.toml");
        std::fs::write(&path, "services_container = \"Svc\"\n").unwrap();
        assert_eq!(ConfigStoreSettings::load(&path).unwrap().services_container, "Svc");
    }
}
