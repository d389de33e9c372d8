//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::config::{Config, ConnectionArgs, ConnectionSettings};
use crate::domain::instance::{Instance, MethodResult};
use crate::domain::object_path::ObjectPath;
use crate::domain::operation::FilterSet;
use crate::domain::params::ParameterSet;

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// CLI 플래그와 설정을 합쳐 연결 정보를 만드는 포트.
pub trait ConnectionResolver: Send + Sync {
    fn resolve(&self, args: &ConnectionArgs, config: &Config) -> Result<ConnectionSettings>;
}

/// CIM 서버에 대한 원격 호출 포트. 호출마다 단 한 번 요청하고 재시도하지 않는다.
#[async_trait]
pub trait CimTransport: Send + Sync {
    async fn get_instance(&self, path: &ObjectPath) -> Result<Instance>;
    async fn enumerate_instances(&self, class: &ObjectPath) -> Result<Vec<Instance>>;
    async fn enumerate_instance_names(&self, class: &ObjectPath) -> Result<Vec<ObjectPath>>;
    async fn associators(&self, path: &ObjectPath, filters: &FilterSet) -> Result<Vec<Instance>>;
    async fn associator_names(
        &self,
        path: &ObjectPath,
        filters: &FilterSet,
    ) -> Result<Vec<ObjectPath>>;
    async fn references(&self, path: &ObjectPath, filters: &FilterSet) -> Result<Vec<Instance>>;
    async fn reference_names(
        &self,
        path: &ObjectPath,
        filters: &FilterSet,
    ) -> Result<Vec<ObjectPath>>;
    async fn invoke_method(
        &self,
        path: &ObjectPath,
        method: &str,
        params: &ParameterSet,
    ) -> Result<MethodResult>;
}

/// 연결 정보로 전송 핸들을 생성하는 팩토리 포트.
pub trait TransportFactory: Send + Sync {
    fn build(&self, settings: &ConnectionSettings) -> Result<Box<dyn CimTransport>>;
}

/// 결과 텍스트 렌더링 포트.
pub trait ResultRenderer: Send + Sync {
    fn render_object_path(&self, path: &ObjectPath) -> String;
    fn render_instance(&self, instance: &Instance) -> String;
    fn render_method_result(&self, result: &MethodResult) -> String;
}

/// 콘솔/로그 출력 추상화 포트.
pub trait Reporter: Send + Sync {
    fn raw(&self, line: &str);
    fn error(&self, message: &str);
}
