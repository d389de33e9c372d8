//! CLI 명령 1회 실행 유스케이스.
//! 입력 검증 → 연결 정보 해석 → 전송 핸들 생성 → 디스패치 순서로 진행한다.

use anyhow::Result;

use crate::application::config::ConnectionArgs;
use crate::application::ports::{
    ConfigRepository, ConnectionResolver, Reporter, ResultRenderer, TransportFactory,
};
use crate::application::usecases::dispatch::{DispatchOutcome, DispatchUseCase};
use crate::domain::operation::Invocation;

/// CLI가 넘겨주는 명령 하나.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub connection: ConnectionArgs,
    pub invocation: Invocation,
}

pub struct InvokeOperationUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub connection_resolver: &'a dyn ConnectionResolver,
    pub transport_factory: &'a dyn TransportFactory,
    pub renderer: &'a dyn ResultRenderer,
    pub reporter: &'a dyn Reporter,
}

impl<'a> InvokeOperationUseCase<'a> {
    /// 입력 형태 오류는 `CimError`를 담은 Err로, 원격 실패는 Ok(RemoteFailed)로 돌려준다.
    pub async fn execute(&self, request: CommandRequest) -> Result<DispatchOutcome> {
        // 원격 호출 전에 식별자/파라미터부터 검증한다.
        let call = request.invocation.into_call()?;

        let config = self.config_repo.load()?;
        let settings = self
            .connection_resolver
            .resolve(&request.connection, &config)?;
        tracing::debug!(?settings, "connection resolved");

        let transport = self.transport_factory.build(&settings)?;

        let dispatcher = DispatchUseCase {
            transport: transport.as_ref(),
            renderer: self.renderer,
            reporter: self.reporter,
        };
        Ok(dispatcher.execute(&call).await)
    }
}
