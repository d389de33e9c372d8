//! CIM 인스턴스/클래스를 식별하는 오브젝트 패스.

use std::collections::BTreeMap;

use crate::domain::value::ScalarValue;

/// 키 이름 → 값. 정렬된 맵이라 출력 순서가 항상 같다.
pub type KeyBindings = BTreeMap<String, ScalarValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub class_name: String,
    /// 비어 있으면 연결 기본 네임스페이스를 쓴다.
    pub namespace: String,
    pub key_bindings: KeyBindings,
}

impl ObjectPath {
    pub fn new(class_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            namespace: namespace.into(),
            key_bindings: KeyBindings::new(),
        }
    }

    /// 키 바인딩을 추가한 패스를 돌려준다(빌더 형태).
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.key_bindings.insert(name.into(), value.into());
        self
    }

    /// 키 바인딩이 없으면 클래스 수준 패스다.
    pub fn is_class_path(&self) -> bool {
        self.key_bindings.is_empty()
    }

    /// 호출에 사용할 네임스페이스를 결정한다.
    pub fn effective_namespace<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.namespace.is_empty() {
            fallback
        } else {
            &self.namespace
        }
    }
}
