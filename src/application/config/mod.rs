//! 애플리케이션이 사용하는 설정 스키마(순수 데이터).
//!
//! 주의: 파일/환경변수 접근은 `infrastructure`에서만 수행한다.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "root/cimv2";
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_CIM_PATH: &str = "/cimom";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 연결 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// 서버 주소(host:port)
    pub location: Option<String>,
    /// 기본 네임스페이스
    pub namespace: Option<String>,
    /// 로그인 사용자
    pub user: Option<String>,
    /// 고정 비밀번호(민감정보: 권장하지 않음)
    pub password: Option<String>,
    /// 비밀번호를 읽을 환경변수 이름
    pub password_env: Option<String>,
    /// http / https
    pub scheme: Option<String>,
    /// CIM-XML 엔드포인트 경로
    pub cim_path: Option<String>,
    /// 요청 타임아웃(ms)
    pub timeout_ms: Option<u64>,
}

/// CLI에서 받은 연결 관련 전역 플래그.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub user: Option<String>,
    pub password: Option<String>,
    pub location: Option<String>,
    pub namespace: Option<String>,
}

/// 플래그/설정/기본값을 모두 해석한 연결 정보.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub scheme: String,
    pub location: String,
    pub cim_path: String,
    pub namespace: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("scheme", &self.scheme)
            .field("location", &self.location)
            .field("cim_path", &self.cim_path)
            .field("namespace", &self.namespace)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Config {
    pub fn namespace(&self) -> String {
        self.defaults
            .namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    pub fn scheme(&self) -> String {
        self.defaults
            .scheme
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string())
    }

    pub fn cim_path(&self) -> String {
        self.defaults
            .cim_path
            .clone()
            .unwrap_or_else(|| DEFAULT_CIM_PATH.to_string())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.defaults.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub fn merge_from(&mut self, other: Config) {
        self.defaults.merge_from(other.defaults);
    }
}

impl DefaultsConfig {
    pub fn merge_from(&mut self, other: DefaultsConfig) {
        merge_field(&mut self.location, other.location);
        merge_field(&mut self.namespace, other.namespace);
        merge_field(&mut self.user, other.user);
        merge_field(&mut self.password, other.password);
        merge_field(&mut self.password_env, other.password_env);
        merge_field(&mut self.scheme, other.scheme);
        merge_field(&mut self.cim_path, other.cim_path);
        merge_field(&mut self.timeout_ms, other.timeout_ms);
    }
}

fn merge_field<T>(target: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *target = incoming;
    }
}
