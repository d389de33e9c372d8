//! 연결 정보 해석 포트 구현 어댑터.

use anyhow::Result;

use crate::application::config::{Config, ConnectionArgs, ConnectionSettings};
use crate::application::ports::ConnectionResolver;
use crate::infrastructure::config;

/// 플래그/설정 파일/환경변수를 합쳐 연결 정보를 만드는 어댑터.
pub struct ConfigConnectionResolver;

impl ConnectionResolver for ConfigConnectionResolver {
    fn resolve(&self, args: &ConnectionArgs, config: &Config) -> Result<ConnectionSettings> {
        config::resolve_connection(args, config)
    }
}
