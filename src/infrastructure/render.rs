//! 결과 텍스트 렌더링 모듈.
//!
//! 오브젝트 패스는 입력 리터럴과 같은 문법으로 출력하므로, 출력 한 줄을 그대로
//! 다음 명령의 식별자 인자로 넘길 수 있다.

use crate::domain::instance::{Instance, MethodResult, PropertyValue};
use crate::domain::literal;
use crate::domain::object_path::ObjectPath;
use crate::domain::value::ScalarValue;

/// 오브젝트 패스를 공백 없는 한 줄 리터럴로 만든다.
pub fn render_object_path(path: &ObjectPath) -> String {
    literal::encode(path)
}

/// 패스 리터럴 한 줄 + 프로퍼티별 `name : value` 줄.
pub fn render_instance(instance: &Instance) -> String {
    let mut out = render_object_path(&instance.path);
    for (name, value) in &instance.properties {
        out.push('\n');
        out.push_str(&format!("{name} : {}", format_property(value)));
    }
    out
}

/// 반환 코드 줄 + 출력 파라미터 줄.
pub fn render_method_result(result: &MethodResult) -> String {
    let mut out = format!("return code: {}", format_property(&result.return_value));
    for (name, value) in &result.out_params {
        out.push('\n');
        out.push_str(&format!("{name} : {}", format_property(value)));
    }
    out
}

pub fn format_property(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => "null".to_string(),
        PropertyValue::Scalar(v) => format_scalar(v),
        PropertyValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(format_scalar).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

pub fn format_scalar(value: &ScalarValue) -> String {
    match value {
        ScalarValue::String(s) => s.clone(),
        ScalarValue::Signed(v) => v.value().to_string(),
        ScalarValue::Unsigned(v) => v.value().to_string(),
        ScalarValue::Reference(path) => render_object_path(path),
    }
}
