//! 적용 설정 진단(inspection) 뷰 모델.

use std::env;

use serde::Serialize;

use super::loader::LoadedConfig;
use super::resolve::resolve_password;
use crate::application::config::{Config, DefaultsConfig};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub defaults: DefaultsConfig,
    pub effective_defaults: EffectiveDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveDefaults {
    pub location: Option<String>,
    pub namespace: String,
    pub user: Option<String>,
    pub password_source: Option<String>,
    pub password_resolved: bool,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let config = &loaded.config;
        let password = resolve_password(config, |name| env::var(name).ok());

        let mut defaults = config.defaults.clone();
        if defaults.password.is_some() {
            defaults.password = Some("***".to_string());
        }

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            defaults,
            effective_defaults: EffectiveDefaults {
                location: config.defaults.location.clone(),
                namespace: config.namespace(),
                user: config.defaults.user.clone(),
                password_source: password.source,
                password_resolved: password.password.is_some(),
                endpoint: endpoint_hint(config),
                timeout_ms: config.timeout_ms(),
            },
        }
    }
}

fn endpoint_hint(config: &Config) -> Option<String> {
    let location = config.defaults.location.as_deref()?;
    if location.contains("://") {
        return Some(format!("{}{}", location.trim_end_matches('/'), config.cim_path()));
    }
    Some(format!("{}://{}{}", config.scheme(), location, config.cim_path()))
}
