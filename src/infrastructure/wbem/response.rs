//! CIM-XML 응답 해석.
//! 엘리먼트 트리를 도메인 값(인스턴스/오브젝트 패스/메서드 결과)으로 바꾼다.

use anyhow::{Context, Result, bail};

use super::xml::{Element, parse_document};
use crate::domain::instance::{Instance, MethodResult, PropertyValue};
use crate::domain::object_path::{KeyBindings, ObjectPath};
use crate::domain::value::{IntWidth, ScalarValue, TypeTag};

/// `GetInstance` 응답. 서버는 경로 없이 INSTANCE만 돌려주므로 요청 경로를 붙인다.
pub(crate) fn instance(xml: &str, path: &ObjectPath) -> Result<Instance> {
    let body = intrinsic_return(xml)?;
    let element = body
        .as_ref()
        .and_then(|rv| rv.child("INSTANCE"))
        .context("GetInstance response has no INSTANCE")?;
    Ok(instance_from(element, path.clone()))
}

/// 인스턴스 목록 응답(VALUE.NAMEDINSTANCE / VALUE.OBJECTWITHPATH 등).
pub(crate) fn instances(xml: &str, default_ns: &str) -> Result<Vec<Instance>> {
    let Some(body) = intrinsic_return(xml)? else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for item in &body.children {
        match item.name.as_str() {
            "VALUE.NAMEDINSTANCE" | "VALUE.OBJECTWITHPATH" | "VALUE.OBJECTWITHLOCALPATH"
            | "VALUE.INSTANCEWITHPATH" => {
                let Some(element) = item.child("INSTANCE") else {
                    tracing::warn!(element = %item.name, "skipping entry without INSTANCE");
                    continue;
                };
                let path = item
                    .children
                    .iter()
                    .find(|c| c.name != "INSTANCE")
                    .context("instance entry has no path")
                    .and_then(|p| path_from(p, default_ns))?;
                out.push(instance_from(element, path));
            }
            other => tracing::warn!(element = %other, "unexpected element in instance list"),
        }
    }
    Ok(out)
}

/// 오브젝트 패스 목록 응답(INSTANCENAME / OBJECTPATH 등).
pub(crate) fn object_paths(xml: &str, default_ns: &str) -> Result<Vec<ObjectPath>> {
    let Some(body) = intrinsic_return(xml)? else {
        return Ok(Vec::new());
    };
    body.children
        .iter()
        .map(|item| path_from(item, default_ns))
        .collect()
}

/// `METHODRESPONSE` 해석.
pub(crate) fn method_result(xml: &str, default_ns: &str) -> Result<MethodResult> {
    let root = parse_document(xml)?;
    let response = simple_response(&root)?.expect_child("METHODRESPONSE")?;
    check_error(response)?;

    let return_value = match response.child("RETURNVALUE") {
        Some(rv) => value_content(rv, rv.attr("PARAMTYPE"), default_ns)?,
        None => PropertyValue::Null,
    };

    let mut out_params = Vec::new();
    for param in response.children_named("PARAMVALUE") {
        let name = param.expect_attr("NAME")?.to_string();
        let value = value_content(param, param.attr("PARAMTYPE"), default_ns)?;
        out_params.push((name, value));
    }

    Ok(MethodResult {
        return_value,
        out_params,
    })
}

fn simple_response(root: &Element) -> Result<&Element> {
    if root.name != "CIM" {
        bail!("unexpected response root <{}>", root.name);
    }
    root.expect_child("MESSAGE")?.expect_child("SIMPLERSP")
}

fn intrinsic_return(xml: &str) -> Result<Option<Element>> {
    let root = parse_document(xml)?;
    let response = simple_response(&root)?.expect_child("IMETHODRESPONSE")?;
    check_error(response)?;
    Ok(response.child("IRETURNVALUE").cloned())
}

fn check_error(response: &Element) -> Result<()> {
    let Some(error) = response.child("ERROR") else {
        return Ok(());
    };
    let code: u32 = error.attr("CODE").and_then(|c| c.parse().ok()).unwrap_or(0);
    let description = error.attr("DESCRIPTION").unwrap_or("");
    bail!("{} (code {code}): {description}", cim_status_name(code))
}

/// DSP0200 표준 상태 코드 이름.
pub(crate) fn cim_status_name(code: u32) -> &'static str {
    match code {
        1 => "CIM_ERR_FAILED",
        2 => "CIM_ERR_ACCESS_DENIED",
        3 => "CIM_ERR_INVALID_NAMESPACE",
        4 => "CIM_ERR_INVALID_PARAMETER",
        5 => "CIM_ERR_INVALID_CLASS",
        6 => "CIM_ERR_NOT_FOUND",
        7 => "CIM_ERR_NOT_SUPPORTED",
        8 => "CIM_ERR_CLASS_HAS_CHILDREN",
        9 => "CIM_ERR_CLASS_HAS_INSTANCES",
        10 => "CIM_ERR_INVALID_SUPERCLASS",
        11 => "CIM_ERR_ALREADY_EXISTS",
        12 => "CIM_ERR_NO_SUCH_PROPERTY",
        13 => "CIM_ERR_TYPE_MISMATCH",
        14 => "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED",
        15 => "CIM_ERR_INVALID_QUERY",
        16 => "CIM_ERR_METHOD_NOT_AVAILABLE",
        17 => "CIM_ERR_METHOD_NOT_FOUND",
        _ => "CIM_ERR_UNKNOWN",
    }
}

fn instance_from(element: &Element, path: ObjectPath) -> Instance {
    let mut instance = Instance::new(path);
    for prop in &element.children {
        let Some(name) = prop.attr("NAME") else {
            continue;
        };
        let value = match prop.name.as_str() {
            "PROPERTY" => match prop.child("VALUE") {
                Some(v) => PropertyValue::Scalar(typed_scalar(prop.attr("TYPE"), &v.text)),
                None => PropertyValue::Null,
            },
            "PROPERTY.ARRAY" => match prop.child("VALUE.ARRAY") {
                Some(arr) => array_value(arr, prop.attr("TYPE")),
                None => PropertyValue::Null,
            },
            "PROPERTY.REFERENCE" => match prop.child("VALUE.REFERENCE") {
                Some(r) => match reference_value(r, &instance.path.namespace) {
                    Ok(path) => PropertyValue::Scalar(ScalarValue::Reference(path)),
                    Err(err) => {
                        tracing::warn!(property = %name, "unreadable reference: {err:#}");
                        PropertyValue::Null
                    }
                },
                None => PropertyValue::Null,
            },
            _ => continue,
        };
        instance.properties.push((name.to_string(), value));
    }
    instance
}

fn array_value(array: &Element, cim_type: Option<&str>) -> PropertyValue {
    let items = array
        .children_named("VALUE")
        .map(|v| typed_scalar(cim_type, &v.text))
        .collect();
    PropertyValue::Array(items)
}

/// RETURNVALUE / PARAMVALUE 안의 값.
fn value_content(holder: &Element, cim_type: Option<&str>, default_ns: &str) -> Result<PropertyValue> {
    if let Some(v) = holder.child("VALUE") {
        return Ok(PropertyValue::Scalar(typed_scalar(cim_type, &v.text)));
    }
    if let Some(arr) = holder.child("VALUE.ARRAY") {
        return Ok(array_value(arr, cim_type));
    }
    if let Some(r) = holder.child("VALUE.REFERENCE") {
        return Ok(PropertyValue::Scalar(ScalarValue::Reference(reference_value(r, default_ns)?)));
    }
    if let Some(arr) = holder.child("VALUE.REFARRAY") {
        let items = arr
            .children_named("VALUE.REFERENCE")
            .map(|r| reference_value(r, default_ns).map(ScalarValue::Reference))
            .collect::<Result<Vec<_>>>()?;
        return Ok(PropertyValue::Array(items));
    }
    Ok(PropertyValue::Null)
}

/// 정수 CIM 타입은 폭을 지켜 만들고, 나머지 타입은 문자열로 둔다.
fn typed_scalar(cim_type: Option<&str>, text: &str) -> ScalarValue {
    let Some(tag) = cim_type.and_then(|t| t.parse::<TypeTag>().ok()) else {
        return ScalarValue::string(text);
    };
    let built = text.trim().parse::<i128>().ok().and_then(|n| tag.build_integer(n));
    match built {
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            tracing::warn!(%tag, value = %text, "integer out of range: {err}");
            ScalarValue::string(text)
        }
        None => ScalarValue::string(text),
    }
}

fn reference_value(reference: &Element, default_ns: &str) -> Result<ObjectPath> {
    let target = reference
        .children
        .first()
        .context("VALUE.REFERENCE is empty")?;
    path_from(target, default_ns)
}

/// 경로를 나타내는 모든 엘리먼트 형태를 오브젝트 패스로 바꾼다.
fn path_from(element: &Element, default_ns: &str) -> Result<ObjectPath> {
    match element.name.as_str() {
        "INSTANCENAME" => instance_name(element, default_ns),
        "CLASSNAME" => Ok(ObjectPath::new(element.expect_attr("NAME")?, default_ns)),
        "LOCALINSTANCEPATH" => {
            let ns = namespace_from(element.expect_child("LOCALNAMESPACEPATH")?);
            instance_name(element.expect_child("INSTANCENAME")?, &ns)
        }
        "INSTANCEPATH" => {
            let ns = namespace_from(
                element
                    .expect_child("NAMESPACEPATH")?
                    .expect_child("LOCALNAMESPACEPATH")?,
            );
            instance_name(element.expect_child("INSTANCENAME")?, &ns)
        }
        "LOCALCLASSPATH" => {
            let ns = namespace_from(element.expect_child("LOCALNAMESPACEPATH")?);
            Ok(ObjectPath::new(element.expect_child("CLASSNAME")?.expect_attr("NAME")?, ns))
        }
        "CLASSPATH" => {
            let ns = namespace_from(
                element
                    .expect_child("NAMESPACEPATH")?
                    .expect_child("LOCALNAMESPACEPATH")?,
            );
            Ok(ObjectPath::new(element.expect_child("CLASSNAME")?.expect_attr("NAME")?, ns))
        }
        "OBJECTPATH" => path_from(
            element.children.first().context("OBJECTPATH is empty")?,
            default_ns,
        ),
        other => bail!("<{other}> is not an object path"),
    }
}

fn namespace_from(local_ns: &Element) -> String {
    local_ns
        .children_named("NAMESPACE")
        .filter_map(|n| n.attr("NAME"))
        .collect::<Vec<_>>()
        .join("/")
}

fn instance_name(element: &Element, namespace: &str) -> Result<ObjectPath> {
    let class_name = element.expect_attr("CLASSNAME")?;
    let mut key_bindings = KeyBindings::new();
    for binding in element.children_named("KEYBINDING") {
        let name = binding.expect_attr("NAME")?.to_string();
        let value = if let Some(kv) = binding.child("KEYVALUE") {
            key_value(kv)
        } else if let Some(r) = binding.child("VALUE.REFERENCE") {
            ScalarValue::Reference(reference_value(r, namespace)?)
        } else {
            bail!("KEYBINDING {name} has no value");
        };
        key_bindings.insert(name, value);
    }
    Ok(ObjectPath {
        class_name: class_name.to_string(),
        namespace: namespace.to_string(),
        key_bindings,
    })
}

fn key_value(element: &Element) -> ScalarValue {
    if let Some(tag) = element.attr("TYPE").and_then(|t| t.parse::<TypeTag>().ok())
        && tag != TypeTag::Str
    {
        return typed_scalar(Some(tag.as_str()), &element.text);
    }
    if element.attr("VALUETYPE") == Some("numeric") {
        let text = element.text.trim();
        let parsed = text.parse::<i128>().ok().and_then(|n| {
            if n < 0 {
                ScalarValue::signed(IntWidth::W64, n).ok()
            } else {
                ScalarValue::unsigned(IntWidth::W64, n).ok()
            }
        });
        if let Some(value) = parsed {
            return value;
        }
        tracing::warn!(value = %text, "numeric key value kept as string");
    }
    ScalarValue::string(element.text.as_str())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn wrap_imethod(inner: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\"><MESSAGE ID=\"1\" PROTOCOLVERSION=\"1.0\">\
             <SIMPLERSP><IMETHODRESPONSE NAME=\"X\">{inner}</IMETHODRESPONSE></SIMPLERSP></MESSAGE></CIM>"
        )
    }

    const VOLUME_NAME: &str = "<INSTANCENAME CLASSNAME=\"StorageVolume\">\
        <KEYBINDING NAME=\"DeviceID\"><KEYVALUE VALUETYPE=\"string\">1</KEYVALUE></KEYBINDING>\
        <KEYBINDING NAME=\"Slot\"><KEYVALUE VALUETYPE=\"numeric\">4</KEYVALUE></KEYBINDING>\
        </INSTANCENAME>";

    fn volume(ns: &str) -> ObjectPath {
        ObjectPath::new("StorageVolume", ns)
            .with_key("DeviceID", "1")
            .with_key("Slot", ScalarValue::unsigned(IntWidth::W64, 4).unwrap())
    }

    #[test]
    fn get_instance_keeps_property_order_and_types() {
        let xml = wrap_imethod(
            "<IRETURNVALUE><INSTANCE CLASSNAME=\"StorageVolume\">\
             <PROPERTY NAME=\"ElementName\" TYPE=\"string\"><VALUE>Volume 1 </VALUE></PROPERTY>\
             <PROPERTY NAME=\"BlockSize\" TYPE=\"uint64\"><VALUE>512</VALUE></PROPERTY>\
             <PROPERTY NAME=\"Caption\" TYPE=\"string\"></PROPERTY>\
             <PROPERTY.ARRAY NAME=\"OperationalStatus\" TYPE=\"uint16\"><VALUE.ARRAY><VALUE>2</VALUE><VALUE>32768</VALUE></VALUE.ARRAY></PROPERTY.ARRAY>\
             <PROPERTY NAME=\"Primordial\" TYPE=\"boolean\"><VALUE>FALSE</VALUE></PROPERTY>\
             </INSTANCE></IRETURNVALUE>",
        );
        let path = volume("root/cimv2");
        let instance = instance(&xml, &path).unwrap();

        assert_eq!(instance.path, path);
        assert_eq!(
            instance.properties,
            vec![
                ("ElementName".to_string(), PropertyValue::from("Volume 1 ")),
                (
                    "BlockSize".to_string(),
                    ScalarValue::unsigned(IntWidth::W64, 512).unwrap().into()
                ),
                ("Caption".to_string(), PropertyValue::Null),
                (
                    "OperationalStatus".to_string(),
                    PropertyValue::Array(vec![
                        ScalarValue::unsigned(IntWidth::W16, 2).unwrap(),
                        ScalarValue::unsigned(IntWidth::W16, 32768).unwrap(),
                    ])
                ),
                ("Primordial".to_string(), PropertyValue::from("FALSE")),
            ]
        );
    }

    #[test]
    fn instance_names_inherit_request_namespace() {
        let xml = wrap_imethod(&format!("<IRETURNVALUE>{VOLUME_NAME}</IRETURNVALUE>"));
        assert_eq!(object_paths(&xml, "root/cimv2").unwrap(), vec![volume("root/cimv2")]);
    }

    #[test]
    fn object_paths_carry_their_own_namespace() {
        let xml = wrap_imethod(&format!(
            "<IRETURNVALUE><OBJECTPATH><INSTANCEPATH><NAMESPACEPATH><HOST>array</HOST>\
             <LOCALNAMESPACEPATH><NAMESPACE NAME=\"root\"/><NAMESPACE NAME=\"emc\"/></LOCALNAMESPACEPATH>\
             </NAMESPACEPATH>{VOLUME_NAME}</INSTANCEPATH></OBJECTPATH></IRETURNVALUE>"
        ));
        assert_eq!(object_paths(&xml, "root/cimv2").unwrap(), vec![volume("root/emc")]);
    }

    #[test]
    fn associators_pair_paths_with_instances() {
        let xml = wrap_imethod(&format!(
            "<IRETURNVALUE><VALUE.OBJECTWITHPATH><INSTANCEPATH><NAMESPACEPATH><HOST>h</HOST>\
             <LOCALNAMESPACEPATH><NAMESPACE NAME=\"interop\"/></LOCALNAMESPACEPATH></NAMESPACEPATH>\
             {VOLUME_NAME}</INSTANCEPATH><INSTANCE CLASSNAME=\"StorageVolume\">\
             <PROPERTY.REFERENCE NAME=\"Owner\"><VALUE.REFERENCE>{VOLUME_NAME}</VALUE.REFERENCE></PROPERTY.REFERENCE>\
             </INSTANCE></VALUE.OBJECTWITHPATH></IRETURNVALUE>"
        ));
        let found = instances(&xml, "root/cimv2").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, volume("interop"));
        assert_eq!(
            found[0].properties,
            vec![(
                "Owner".to_string(),
                PropertyValue::Scalar(ScalarValue::Reference(volume("interop")))
            )]
        );
    }

    #[test]
    fn empty_return_value_means_no_results() {
        let xml = wrap_imethod("<IRETURNVALUE></IRETURNVALUE>");
        assert!(instances(&xml, "ns").unwrap().is_empty());
        let xml = wrap_imethod("");
        assert!(object_paths(&xml, "ns").unwrap().is_empty());
    }

    #[test]
    fn cim_error_becomes_transport_error() {
        let xml = wrap_imethod("<ERROR CODE=\"6\" DESCRIPTION=\"No such instance\"/>");
        let err = instances(&xml, "ns").unwrap_err();
        assert_eq!(err.to_string(), "CIM_ERR_NOT_FOUND (code 6): No such instance");
    }

    #[test]
    fn method_response_reads_return_value_and_outputs() {
        let xml = format!(
            "<CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\"><MESSAGE ID=\"1\" PROTOCOLVERSION=\"1.0\">\
             <SIMPLERSP><METHODRESPONSE NAME=\"CreateElement\">\
             <RETURNVALUE PARAMTYPE=\"uint32\"><VALUE>4096</VALUE></RETURNVALUE>\
             <PARAMVALUE NAME=\"Job\" PARAMTYPE=\"reference\"><VALUE.REFERENCE>{VOLUME_NAME}</VALUE.REFERENCE></PARAMVALUE>\
             <PARAMVALUE NAME=\"Size\" PARAMTYPE=\"uint64\"><VALUE>10</VALUE></PARAMVALUE>\
             </METHODRESPONSE></SIMPLERSP></MESSAGE></CIM>"
        );
        let result = method_result(&xml, "root/cimv2").unwrap();

        assert_eq!(
            result.return_value,
            ScalarValue::unsigned(IntWidth::W32, 4096).unwrap().into()
        );
        assert_eq!(
            result.out_params,
            vec![
                (
                    "Job".to_string(),
                    ScalarValue::Reference(volume("root/cimv2")).into()
                ),
                (
                    "Size".to_string(),
                    ScalarValue::unsigned(IntWidth::W64, 10).unwrap().into()
                ),
            ]
        );
    }

    #[test]
    fn non_cim_documents_are_rejected() {
        assert!(object_paths("<html><body>login</body></html>", "ns").is_err());
    }
}
