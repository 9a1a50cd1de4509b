use std::sync::Arc;

use anyhow::Result;

use crate::settings::SettingsStore;

/// Sentinel left in place when no key was injected at build time; a CI build
/// sets GOALLOCK_GEMINI_API_KEY and the injected value wins over the store.
const API_KEY_PLACEHOLDER: &str = "__GEMINI_API_KEY_PLACEHOLDER__";

const INJECTED_API_KEY: Option<&str> = option_env!("GOALLOCK_GEMINI_API_KEY");

/// Resolves the Gemini API credential: the build-injected value when it is
/// real, otherwise whatever the user saved locally. Nothing validates the
/// key's shape here; a bad key only surfaces when the verifier calls out.
#[derive(Clone)]
pub struct CredentialStore {
    injected: Option<&'static str>,
    settings: Arc<SettingsStore>,
}

impl CredentialStore {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self {
            injected: INJECTED_API_KEY,
            settings,
        }
    }

    #[cfg(test)]
    fn with_injected(settings: Arc<SettingsStore>, injected: Option<&'static str>) -> Self {
        Self { injected, settings }
    }

    pub fn get(&self) -> Option<String> {
        if let Some(injected) = self.injected {
            if !injected.is_empty() && injected != API_KEY_PLACEHOLDER {
                return Some(injected.to_string());
            }
        }
        self.settings
            .api_key()
            .filter(|key| !key.is_empty() && key.as_str() != API_KEY_PLACEHOLDER)
    }

    pub fn has(&self) -> bool {
        self.get().is_some()
    }

    pub fn set(&self, key: String) -> Result<()> {
        self.settings.update_api_key(key)
    }
}
