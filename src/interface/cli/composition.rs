//! 애플리케이션 조립(composition root) 모듈.

use crate::application::usecases::inspect_config::InspectConfigUseCase;
use crate::application::usecases::invoke_operation::InvokeOperationUseCase;
use crate::infrastructure::adapters::{
    ConfigConnectionResolver, ConsoleReporter, JsonConfigRepository, TextRendererAdapter,
    WbemTransportFactory,
};

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    connection_resolver: ConfigConnectionResolver,
    transport_factory: WbemTransportFactory,
    renderer: TextRendererAdapter,
    reporter: ConsoleReporter,
}

impl Default for AppComposition {
    fn default() -> Self {
        Self {
            config_repo: JsonConfigRepository,
            connection_resolver: ConfigConnectionResolver,
            transport_factory: WbemTransportFactory,
            renderer: TextRendererAdapter,
            reporter: ConsoleReporter,
        }
    }
}

impl AppComposition {
    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_config_usecase(&self) -> InspectConfigUseCase<'_> {
        InspectConfigUseCase {
            config_repo: &self.config_repo,
        }
    }

    /// 원격 오퍼레이션 실행 유스케이스를 생성한다.
    pub fn invoke_operation_usecase(&self) -> InvokeOperationUseCase<'_> {
        InvokeOperationUseCase {
            config_repo: &self.config_repo,
            connection_resolver: &self.connection_resolver,
            transport_factory: &self.transport_factory,
            renderer: &self.renderer,
            reporter: &self.reporter,
        }
    }
}
