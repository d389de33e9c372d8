//! WBEM(CIM-XML over HTTP) 전송 계층.
//! 요청 문서 생성, 응답 해석, HTTP 호출을 나눠 둔다.

pub mod client;
mod request;
mod response;
mod xml;

pub use client::WbemClient;
