//! CIM 전송 포트 구현 어댑터.

use anyhow::Result;

use crate::application::config::ConnectionSettings;
use crate::application::ports::{CimTransport, TransportFactory};
use crate::infrastructure::wbem::WbemClient;

/// CIM-XML/HTTP 클라이언트를 만드는 팩토리 어댑터.
pub struct WbemTransportFactory;

impl TransportFactory for WbemTransportFactory {
    fn build(&self, settings: &ConnectionSettings) -> Result<Box<dyn CimTransport>> {
        let client = WbemClient::new(settings)?;
        tracing::debug!(endpoint = %client.endpoint(), namespace = %settings.namespace, "CIM transport ready");
        Ok(Box::new(client))
    }
}
