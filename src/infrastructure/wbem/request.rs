//! CIM-XML 요청 본문 생성.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::escape::escape;

use crate::domain::object_path::ObjectPath;
use crate::domain::params::ParameterSet;
use crate::domain::value::ScalarValue;

/// CIMObject 헤더 값에서 그대로 두는 문자.
const CIM_OBJECT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b':')
    .remove(b'.')
    .remove(b'_')
    .remove(b'-')
    .remove(b'=')
    .remove(b',');

/// 내장(intrinsic) 메서드 파라미터 값.
#[derive(Debug, Clone, Copy)]
pub(crate) enum IParam<'a> {
    InstanceName(&'a ObjectPath),
    ClassName(&'a str),
    Value(&'a str),
}

/// `IMETHODCALL` 요청 문서.
pub(crate) fn intrinsic_call(
    message_id: u32,
    method: &str,
    namespace: &str,
    params: &[(&str, IParam<'_>)],
) -> String {
    let mut body = format!("<IMETHODCALL NAME=\"{}\">", escape(method));
    write_local_namespace_path(&mut body, namespace);
    for (name, value) in params {
        body.push_str(&format!("<IPARAMVALUE NAME=\"{}\">", escape(*name)));
        match value {
            IParam::InstanceName(path) => write_instance_name(&mut body, path),
            IParam::ClassName(class) => {
                body.push_str(&format!("<CLASSNAME NAME=\"{}\"/>", escape(*class)));
            }
            IParam::Value(text) => {
                body.push_str(&format!("<VALUE>{}</VALUE>", escape(*text)));
            }
        }
        body.push_str("</IPARAMVALUE>");
    }
    body.push_str("</IMETHODCALL>");
    envelope(message_id, &body)
}

/// `METHODCALL` 요청 문서. 키 바인딩이 없으면 클래스 정적 메서드로 보낸다.
pub(crate) fn extrinsic_call(
    message_id: u32,
    method: &str,
    namespace: &str,
    target: &ObjectPath,
    params: &ParameterSet,
) -> String {
    let mut body = format!("<METHODCALL NAME=\"{}\">", escape(method));
    if target.is_class_path() {
        body.push_str("<LOCALCLASSPATH>");
        write_local_namespace_path(&mut body, namespace);
        body.push_str(&format!("<CLASSNAME NAME=\"{}\"/>", escape(&target.class_name)));
        body.push_str("</LOCALCLASSPATH>");
    } else {
        body.push_str("<LOCALINSTANCEPATH>");
        write_local_namespace_path(&mut body, namespace);
        write_instance_name(&mut body, target);
        body.push_str("</LOCALINSTANCEPATH>");
    }
    for (name, value) in params {
        write_param_value(&mut body, name, value);
    }
    body.push_str("</METHODCALL>");
    envelope(message_id, &body)
}

/// CIMObject 헤더 값. 전체 경로를 만든 뒤 URI 이스케이프는 한 번만 적용한다.
pub(crate) fn cim_object_header(namespace: &str, target: Option<&ObjectPath>) -> String {
    let mut raw = namespace.to_string();
    if let Some(path) = target {
        raw.push(':');
        raw.push_str(&untyped_path(path));
    }
    utf8_percent_encode(&raw, CIM_OBJECT_SET).to_string()
}

/// `Class.k="v",n=1` 형태의 이스케이프 전 경로. 참조 키는 재귀로 펼친다.
fn untyped_path(path: &ObjectPath) -> String {
    let mut out = path.class_name.clone();
    for (idx, (key, value)) in path.key_bindings.iter().enumerate() {
        out.push(if idx == 0 { '.' } else { ',' });
        out.push_str(&format!("{key}={}", untyped_key_value(value)));
    }
    out
}

fn untyped_key_value(value: &ScalarValue) -> String {
    match value {
        ScalarValue::String(s) => quote_key(s),
        ScalarValue::Signed(v) => v.value().to_string(),
        ScalarValue::Unsigned(v) => v.value().to_string(),
        ScalarValue::Reference(path) if path.namespace.is_empty() => quote_key(&untyped_path(path)),
        ScalarValue::Reference(path) => {
            quote_key(&format!("{}:{}", path.namespace, untyped_path(path)))
        }
    }
}

fn quote_key(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn envelope(message_id: u32, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
         <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\
         <MESSAGE ID=\"{message_id}\" PROTOCOLVERSION=\"1.0\">\
         <SIMPLEREQ>{body}</SIMPLEREQ></MESSAGE></CIM>"
    )
}

fn write_local_namespace_path(out: &mut String, namespace: &str) {
    out.push_str("<LOCALNAMESPACEPATH>");
    for segment in namespace.split('/').filter(|s| !s.is_empty()) {
        out.push_str(&format!("<NAMESPACE NAME=\"{}\"/>", escape(segment)));
    }
    out.push_str("</LOCALNAMESPACEPATH>");
}

fn write_instance_name(out: &mut String, path: &ObjectPath) {
    out.push_str(&format!("<INSTANCENAME CLASSNAME=\"{}\">", escape(&path.class_name)));
    for (key, value) in &path.key_bindings {
        out.push_str(&format!("<KEYBINDING NAME=\"{}\">", escape(key)));
        match value {
            ScalarValue::String(s) => {
                out.push_str(&format!("<KEYVALUE VALUETYPE=\"string\">{}</KEYVALUE>", escape(s)));
            }
            ScalarValue::Signed(_) | ScalarValue::Unsigned(_) => {
                out.push_str(&format!(
                    "<KEYVALUE VALUETYPE=\"numeric\" TYPE=\"{}\">{}</KEYVALUE>",
                    value.cim_type(),
                    integer_text(value)
                ));
            }
            ScalarValue::Reference(inner) => write_value_reference(out, inner),
        }
        out.push_str("</KEYBINDING>");
    }
    out.push_str("</INSTANCENAME>");
}

fn write_value_reference(out: &mut String, path: &ObjectPath) {
    out.push_str("<VALUE.REFERENCE>");
    if path.namespace.is_empty() {
        write_instance_name(out, path);
    } else {
        out.push_str("<LOCALINSTANCEPATH>");
        write_local_namespace_path(out, &path.namespace);
        write_instance_name(out, path);
        out.push_str("</LOCALINSTANCEPATH>");
    }
    out.push_str("</VALUE.REFERENCE>");
}

fn write_param_value(out: &mut String, name: &str, value: &ScalarValue) {
    out.push_str(&format!(
        "<PARAMVALUE NAME=\"{}\" PARAMTYPE=\"{}\">",
        escape(name),
        value.cim_type()
    ));
    match value {
        ScalarValue::String(s) => out.push_str(&format!("<VALUE>{}</VALUE>", escape(s))),
        ScalarValue::Signed(_) | ScalarValue::Unsigned(_) => {
            out.push_str(&format!("<VALUE>{}</VALUE>", integer_text(value)));
        }
        ScalarValue::Reference(path) => write_value_reference(out, path),
    }
    out.push_str("</PARAMVALUE>");
}

fn integer_text(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Signed(v) => v.value().to_string(),
        ScalarValue::Unsigned(v) => v.value().to_string(),
        _ => String::new(),
    }
}
