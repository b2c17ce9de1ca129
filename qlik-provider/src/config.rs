//! Provider configuration
//!
//! Settings come from the host configuration first and fall back to the
//! process environment. Resolution never reads the environment directly; it
//! goes through an [`EnvLookup`] so tests can supply fixed values.

use std::collections::HashMap;

use qlik_core::diagnostics::Diagnostics;
use serde::Deserialize;

pub const ENV_TENANT_ID: &str = "QLIK_TENANT_ID";
pub const ENV_REGION: &str = "QLIK_REGION";
pub const ENV_CLIENT_ID: &str = "QLIK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "QLIK_CLIENT_SECRET";

/// Source of environment variables
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Provider block as written in host configuration
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub tenant_id: Option<String>,
    pub region: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Overrides the tenant URL derived from tenant id and region
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Fully resolved configuration; every field is non-empty
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub tenant_id: String,
    pub region: String,
    pub client_id: String,
    pub client_secret: String,
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// Tenant URL, e.g. `https://acme.eu.qlikcloud.com`
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.qlikcloud.com", self.tenant_id, self.region),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

struct Setting {
    attribute: &'static str,
    env: &'static str,
    summary: &'static str,
    label: &'static str,
}

const TENANT_ID: Setting = Setting {
    attribute: "tenant_id",
    env: ENV_TENANT_ID,
    summary: "Missing Qlik Cloud Tenant ID",
    label: "Qlik Cloud Tenant ID",
};

const REGION: Setting = Setting {
    attribute: "region",
    env: ENV_REGION,
    summary: "Missing Qlik Cloud Region",
    label: "Qlik Cloud region",
};

const CLIENT_ID: Setting = Setting {
    attribute: "client_id",
    env: ENV_CLIENT_ID,
    summary: "Missing Qlik Cloud Client ID",
    label: "Qlik Cloud Client ID",
};

const CLIENT_SECRET: Setting = Setting {
    attribute: "client_secret",
    env: ENV_CLIENT_SECRET,
    summary: "Missing Qlik Cloud Client Secret",
    label: "Qlik Cloud Client Secret",
};

impl Setting {
    /// Configured value, else the environment; empty strings count as unset
    fn resolve(
        &self,
        configured: Option<&String>,
        env: &dyn EnvLookup,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let value = configured
            .filter(|v| !v.is_empty())
            .cloned()
            .or_else(|| env.get(self.env).filter(|v| !v.is_empty()));

        match value {
            Some(value) => value,
            None => {
                diagnostics.add_attribute_error(
                    self.attribute,
                    self.summary,
                    format!(
                        "The provider cannot create the Qlik Cloud API client as there is a missing or empty value for the {}. \
                         Set the {} value in the configuration or use the {} environment variable. \
                         If either is already set, ensure the value is not empty.",
                        self.label, self.attribute, self.env
                    ),
                );
                String::new()
            }
        }
    }
}

/// Merge configuration with the environment
///
/// Every missing setting is reported; resolution fails only after all four
/// have been checked.
pub fn resolve_config(
    settings: &ProviderSettings,
    env: &dyn EnvLookup,
) -> Result<ProviderConfig, Diagnostics> {
    let mut diagnostics = Diagnostics::new();

    let tenant_id = TENANT_ID.resolve(settings.tenant_id.as_ref(), env, &mut diagnostics);
    let region = REGION.resolve(settings.region.as_ref(), env, &mut diagnostics);
    let client_id = CLIENT_ID.resolve(settings.client_id.as_ref(), env, &mut diagnostics);
    let client_secret =
        CLIENT_SECRET.resolve(settings.client_secret.as_ref(), env, &mut diagnostics);

    if diagnostics.has_error() {
        return Err(diagnostics);
    }

    Ok(ProviderConfig {
        tenant_id,
        region,
        client_id,
        client_secret,
        endpoint: settings.endpoint.clone().filter(|e| !e.is_empty()),
    })
}
