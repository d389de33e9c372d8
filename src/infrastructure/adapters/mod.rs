//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod config_repository;
mod connection_resolver;
mod reporter;
mod result_renderer;
mod transport_factory;

pub use config_repository::JsonConfigRepository;
pub use connection_resolver::ConfigConnectionResolver;
pub use reporter::ConsoleReporter;
pub use result_renderer::TextRendererAdapter;
pub use transport_factory::WbemTransportFactory;
