//! CIM-XML over HTTP 클라이언트.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::request::{self, IParam};
use super::response;
use crate::application::config::ConnectionSettings;
use crate::application::ports::CimTransport;
use crate::domain::instance::{Instance, MethodResult};
use crate::domain::object_path::ObjectPath;
use crate::domain::operation::FilterSet;
use crate::domain::params::ParameterSet;

pub struct WbemClient {
    client: Client,
    endpoint: Url,
    namespace: String,
    user: Option<String>,
    password: Option<String>,
    next_message_id: AtomicU32,
}

impl WbemClient {
    /// 연결 정보로 클라이언트를 만든다. 네트워크 접속은 첫 호출 때 일어난다.
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let cim_path = if settings.cim_path.starts_with('/') {
            settings.cim_path.clone()
        } else {
            format!("/{}", settings.cim_path)
        };
        let raw = format!("{}://{}{}", settings.scheme, settings.location, cim_path);
        let endpoint = Url::parse(&raw).with_context(|| format!("invalid CIM endpoint `{raw}`"))?;

        // 관리망 장비에 직접 붙으므로 시스템 프록시는 쓰지 않는다.
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(concat!("smis/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            namespace: settings.namespace.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            next_message_id: AtomicU32::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn namespace_for<'a>(&'a self, path: &'a ObjectPath) -> &'a str {
        path.effective_namespace(&self.namespace)
    }

    fn message_id(&self) -> u32 {
        self.next_message_id.fetch_add(1, Ordering::Relaxed)
    }

    fn request(&self, method: &str, object: &str) -> RequestBuilder {
        // DSP0200 확장 헤더와 인증을 공통 적용한다.
        let req = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/xml; charset=\"utf-8\"")
            .header("CIMProtocolVersion", "1.0")
            .header("CIMOperation", "MethodCall")
            .header("CIMMethod", method)
            .header("CIMObject", object);

        match &self.user {
            Some(user) => req.basic_auth(user, self.password.as_deref()),
            None => req,
        }
    }

    async fn post(&self, method: &str, object: &str, body: String) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, %method, %object, "sending CIM request");

        let resp = self
            .request(method, object)
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?;

        let status = resp.status();
        let cim_error = resp
            .headers()
            .get("CIMError")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp
            .text()
            .await
            .context("failed to read CIM response body")?;

        if !status.is_success() {
            let detail = cim_error.map(|e| format!(" [CIMError: {e}]")).unwrap_or_default();
            bail!("HTTP {status}{detail}: {}", text.trim());
        }
        if let Some(error) = cim_error {
            bail!("server rejected request (CIMError: {error})");
        }
        Ok(text)
    }

    async fn intrinsic(
        &self,
        method: &str,
        namespace: &str,
        params: &[(&str, IParam<'_>)],
    ) -> Result<String> {
        let body = request::intrinsic_call(self.message_id(), method, namespace, params);
        let object = request::cim_object_header(namespace, None);
        self.post(method, &object, body).await
    }

    async fn traverse(
        &self,
        method: &str,
        path: &ObjectPath,
        filters: &FilterSet,
    ) -> Result<(String, String)> {
        let namespace = self.namespace_for(path).to_string();
        let mut params = vec![("ObjectName", IParam::InstanceName(path))];
        for (filter, value) in filters {
            let param = if filter.is_class_name() {
                IParam::ClassName(value.as_str())
            } else {
                IParam::Value(value.as_str())
            };
            params.push((filter.param_name(), param));
        }
        let xml = self.intrinsic(method, &namespace, &params).await?;
        Ok((xml, namespace))
    }
}

#[async_trait]
impl CimTransport for WbemClient {
    async fn get_instance(&self, path: &ObjectPath) -> Result<Instance> {
        let namespace = self.namespace_for(path).to_string();
        let xml = self
            .intrinsic("GetInstance", &namespace, &[("InstanceName", IParam::InstanceName(path))])
            .await?;
        let mut resolved = path.clone();
        resolved.namespace = namespace;
        response::instance(&xml, &resolved)
    }

    async fn enumerate_instances(&self, class: &ObjectPath) -> Result<Vec<Instance>> {
        let namespace = self.namespace_for(class).to_string();
        let xml = self
            .intrinsic(
                "EnumerateInstances",
                &namespace,
                &[("ClassName", IParam::ClassName(&class.class_name))],
            )
            .await?;
        response::instances(&xml, &namespace)
    }

    async fn enumerate_instance_names(&self, class: &ObjectPath) -> Result<Vec<ObjectPath>> {
        let namespace = self.namespace_for(class).to_string();
        let xml = self
            .intrinsic(
                "EnumerateInstanceNames",
                &namespace,
                &[("ClassName", IParam::ClassName(&class.class_name))],
            )
            .await?;
        response::object_paths(&xml, &namespace)
    }

    async fn associators(&self, path: &ObjectPath, filters: &FilterSet) -> Result<Vec<Instance>> {
        let (xml, namespace) = self.traverse("Associators", path, filters).await?;
        response::instances(&xml, &namespace)
    }

    async fn associator_names(
        &self,
        path: &ObjectPath,
        filters: &FilterSet,
    ) -> Result<Vec<ObjectPath>> {
        let (xml, namespace) = self.traverse("AssociatorNames", path, filters).await?;
        response::object_paths(&xml, &namespace)
    }

    async fn references(&self, path: &ObjectPath, filters: &FilterSet) -> Result<Vec<Instance>> {
        let (xml, namespace) = self.traverse("References", path, filters).await?;
        response::instances(&xml, &namespace)
    }

    async fn reference_names(
        &self,
        path: &ObjectPath,
        filters: &FilterSet,
    ) -> Result<Vec<ObjectPath>> {
        let (xml, namespace) = self.traverse("ReferenceNames", path, filters).await?;
        response::object_paths(&xml, &namespace)
    }

    async fn invoke_method(
        &self,
        path: &ObjectPath,
        method: &str,
        params: &ParameterSet,
    ) -> Result<MethodResult> {
        let namespace = self.namespace_for(path).to_string();
        let body = request::extrinsic_call(self.message_id(), method, &namespace, path, params);
        let object = request::cim_object_header(&namespace, Some(path));
        let xml = self.post(method, &object, body).await?;
        response::method_result(&xml, &namespace)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::domain::operation::Filter;

    fn settings(location: String) -> ConnectionSettings {
        ConnectionSettings {
            scheme: "http".to_string(),
            location,
            cim_path: "/cimom".to_string(),
            namespace: "root/cimv2".to_string(),
            user: Some("admin".to_string()),
            password: Some("secret".to_string()),
            timeout_ms: 5_000,
        }
    }

    /// 요청 하나를 받아 기록하고 준비된 응답을 돌려주는 로컬 서버.
    async fn one_shot_server(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            while !String::from_utf8_lossy(&received).contains("</CIM>") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });
        (addr, handle)
    }

    const NAMES_RESPONSE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
        <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\"><MESSAGE ID=\"1\" PROTOCOLVERSION=\"1.0\">\
        <SIMPLERSP><IMETHODRESPONSE NAME=\"AssociatorNames\"><IRETURNVALUE>\
        <INSTANCENAME CLASSNAME=\"StoragePool\"><KEYBINDING NAME=\"InstanceID\">\
        <KEYVALUE VALUETYPE=\"string\">P1</KEYVALUE></KEYBINDING></INSTANCENAME>\
        </IRETURNVALUE></IMETHODRESPONSE></SIMPLERSP></MESSAGE></CIM>";

    #[tokio::test]
    async fn associator_names_posts_cim_xml_and_parses_paths() {
        let (addr, server) = one_shot_server("200 OK", NAMES_RESPONSE.to_string()).await;
        let client = WbemClient::new(&settings(addr)).unwrap();

        let volume = ObjectPath::new("StorageVolume", "").with_key("DeviceID", "1");
        let mut filters = FilterSet::new();
        filters.insert(Filter::ResultClass, "StoragePool".to_string());

        let paths = client.associator_names(&volume, &filters).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(
            paths,
            vec![ObjectPath::new("StoragePool", "root/cimv2").with_key("InstanceID", "P1")]
        );
        assert!(request.starts_with("POST /cimom HTTP/1.1"));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("cimoperation: methodcall"));
        assert!(lower.contains("cimmethod: associatornames"));
        assert!(lower.contains("authorization: basic "));
        assert!(request.contains("<IPARAMVALUE NAME=\"ResultClass\"><CLASSNAME NAME=\"StoragePool\"/>"));
        assert!(!request.contains("AssocClass"));
    }

    #[tokio::test]
    async fn http_failure_surfaces_cim_error_header() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let mut received = Vec::new();
            while !String::from_utf8_lossy(&received).contains("</CIM>") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 400 Bad Request\r\nCIMError: request-not-valid\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            socket.shutdown().await.ok();
        });

        let client = WbemClient::new(&settings(addr)).unwrap();
        let err = client
            .get_instance(&ObjectPath::new("StorageVolume", "").with_key("DeviceID", "1"))
            .await
            .unwrap_err();
        server.await.unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("400"), "{message}");
        assert!(message.contains("request-not-valid"), "{message}");
    }

    #[test]
    fn endpoint_joins_scheme_location_and_path() {
        let mut s = settings("array.example:5989".to_string());
        s.scheme = "https".to_string();
        s.cim_path = "cimom".to_string();
        let client = WbemClient::new(&s).unwrap();
        assert_eq!(client.endpoint().as_str(), "https://array.example:5989/cimom");
    }
}
