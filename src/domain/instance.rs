//! 원격 서버가 돌려주는 인스턴스와 메서드 호출 결과.

use crate::domain::object_path::ObjectPath;
use crate::domain::value::ScalarValue;

/// 프로퍼티 값. 서버 응답에는 null/배열도 섞여 있다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Null,
    Scalar(ScalarValue),
    Array(Vec<ScalarValue>),
}

impl From<ScalarValue> for PropertyValue {
    fn from(value: ScalarValue) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(ScalarValue::string(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub path: ObjectPath,
    /// 서버가 돌려준 순서 그대로 유지한다.
    pub properties: Vec<(String, PropertyValue)>,
}

impl Instance {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }
}

/// InvokeMethod 결과: 반환 코드와 출력 파라미터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResult {
    pub return_value: PropertyValue,
    pub out_params: Vec<(String, PropertyValue)>,
}
