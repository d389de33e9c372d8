//! CLI 플래그 + 설정 값을 실제 연결 정보로 해석하는 유틸리티.
//!
//! - 환경변수 접근은 인프라 계층에서만 수행한다.

use std::env;

use anyhow::{Result, bail};

use crate::application::config::{Config, ConnectionArgs, ConnectionSettings};

/// 비밀번호 해석 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResolution {
    pub password: Option<String>,
    pub source: Option<String>,
}

/// 플래그 > 설정 파일 > 기본값 순으로 연결 정보를 결정한다.
pub fn resolve_connection(args: &ConnectionArgs, config: &Config) -> Result<ConnectionSettings> {
    resolve_connection_with(args, config, |name| env::var(name).ok())
}

pub(crate) fn resolve_connection_with(
    args: &ConnectionArgs,
    config: &Config,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> Result<ConnectionSettings> {
    let Some(raw_location) = non_empty(args.location.as_deref())
        .or_else(|| non_empty(config.defaults.location.as_deref()))
    else {
        bail!("server location is not configured (use -l/--location or defaults.location)");
    };

    // `https://host:5989` 형태로 넘겨도 스킴을 분리해 받아들인다.
    let (scheme, location) = match raw_location.split_once("://") {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest.trim_end_matches('/')),
        None => (config.scheme(), raw_location),
    };
    if scheme != "http" && scheme != "https" {
        bail!("unsupported scheme `{scheme}` (expected http or https)");
    }

    let namespace = non_empty(args.namespace.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| config.namespace());

    let user = non_empty(args.user.as_deref())
        .or_else(|| non_empty(config.defaults.user.as_deref()))
        .map(str::to_string);

    let password = match given(args.password.as_deref()) {
        Some(p) => Some(p.to_string()),
        None => resolve_password(config, &lookup_env).password,
    };

    Ok(ConnectionSettings {
        scheme,
        location: location.to_string(),
        cim_path: config.cim_path(),
        namespace,
        user,
        password,
        timeout_ms: config.timeout_ms(),
    })
}

/// 설정의 고정 비밀번호 또는 `password_env` 환경변수에서 비밀번호를 찾는다.
pub fn resolve_password(
    config: &Config,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> PasswordResolution {
    if let Some(password) = given(config.defaults.password.as_deref()) {
        return PasswordResolution {
            password: Some(password.to_string()),
            source: Some("inline".to_string()),
        };
    }

    if let Some(env_name) = non_empty(config.defaults.password_env.as_deref()) {
        return match lookup_env(env_name).filter(|v| !v.is_empty()) {
            Some(v) => PasswordResolution {
                password: Some(v),
                source: Some(format!("env:{env_name}")),
            },
            None => PasswordResolution {
                password: None,
                source: Some(format!("env:{env_name} (missing)")),
            },
        };
    }

    PasswordResolution {
        password: None,
        source: None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 비밀번호는 공백도 값의 일부이므로 다듬지 않는다.
fn given(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
