//! 검증된 호출 형태를 원격 오퍼레이션 하나로 실행하고 결과를 출력하는 디스패처.

use anyhow::Result;

use crate::application::ports::{CimTransport, Reporter, ResultRenderer};
use crate::domain::error::CimError;
use crate::domain::instance::Instance;
use crate::domain::object_path::ObjectPath;
use crate::domain::operation::CimCall;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 원격 호출이 끝났고 `rendered`개 항목을 출력했다.
    Completed { rendered: usize },
    /// 원격 호출이 실패했고 오류를 이미 보고했다.
    RemoteFailed(CimError),
}

pub struct DispatchUseCase<'a> {
    pub transport: &'a dyn CimTransport,
    pub renderer: &'a dyn ResultRenderer,
    pub reporter: &'a dyn Reporter,
}

impl<'a> DispatchUseCase<'a> {
    /// 호출 하나를 실행한다. 원격 실패는 여기서 `RemoteOperation`으로 바꿔 보고한다.
    pub async fn execute(&self, call: &CimCall) -> DispatchOutcome {
        let operation = call.operation();
        tracing::info!(%operation, "dispatching remote operation");

        match self.issue(call).await {
            Ok(rendered) => {
                tracing::debug!(%operation, rendered, "remote operation completed");
                DispatchOutcome::Completed { rendered }
            }
            Err(err) => {
                let error = CimError::RemoteOperation {
                    operation: operation.method_name().to_string(),
                    message: format!("{err:#}"),
                };
                self.reporter.error(&error.to_string());
                DispatchOutcome::RemoteFailed(error)
            }
        }
    }

    async fn issue(&self, call: &CimCall) -> Result<usize> {
        let t = self.transport;
        match call {
            CimCall::GetInstance { path } => {
                let instance = t.get_instance(path).await?;
                Ok(self.emit_instances(std::slice::from_ref(&instance)))
            }
            CimCall::EnumerateInstances { class } => {
                Ok(self.emit_instances(&t.enumerate_instances(class).await?))
            }
            CimCall::EnumerateInstanceNames { class } => {
                Ok(self.emit_paths(&t.enumerate_instance_names(class).await?))
            }
            CimCall::Associators { path, filters } => {
                Ok(self.emit_instances(&t.associators(path, filters).await?))
            }
            CimCall::AssociatorNames { path, filters } => {
                Ok(self.emit_paths(&t.associator_names(path, filters).await?))
            }
            CimCall::References { path, filters } => {
                Ok(self.emit_instances(&t.references(path, filters).await?))
            }
            CimCall::ReferenceNames { path, filters } => {
                Ok(self.emit_paths(&t.reference_names(path, filters).await?))
            }
            CimCall::InvokeMethod {
                path,
                method,
                params,
            } => {
                let result = t.invoke_method(path, method, params).await?;
                self.reporter
                    .raw(&self.renderer.render_method_result(&result));
                Ok(1)
            }
        }
    }

    fn emit_instances(&self, instances: &[Instance]) -> usize {
        // 서버가 돌려준 순서 그대로, 인스턴스 사이에 빈 줄을 둔다.
        for instance in instances {
            self.reporter.raw(&self.renderer.render_instance(instance));
            self.reporter.raw("");
        }
        instances.len()
    }

    fn emit_paths(&self, paths: &[ObjectPath]) -> usize {
        for path in paths {
            self.reporter.raw(&self.renderer.render_object_path(path));
        }
        paths.len()
    }
}
