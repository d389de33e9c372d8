//! 오퍼레이션 셀렉터 → 호출 형태 매핑 테이블.
//!
//! 셀렉터마다 필요한 식별자 종류, 허용 필터, 결과 종류를 [`OperationSchema`]로
//! 고정해 두고, CLI에서 넘어온 [`Invocation`]을 검증된 [`CimCall`]로 바꾼다.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::{CimError, Result};
use crate::domain::literal;
use crate::domain::object_path::ObjectPath;
use crate::domain::params::{self, ParameterSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetInstance,
    EnumerateInstances,
    EnumerateInstanceNames,
    Associators,
    AssociatorNames,
    References,
    ReferenceNames,
    InvokeMethod,
}

/// 위치 인자로 받는 식별자의 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// 오브젝트 패스 리터럴
    InstancePath,
    /// 클래스 이름(또는 키 바인딩 없는 리터럴)
    ClassName,
    /// 인스턴스 패스 또는 클래스 패스(정적 메서드)
    MethodTarget,
}

/// 연관/참조 탐색용 선택 필터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Filter {
    AssocClass,
    ResultClass,
    Role,
    ResultRole,
}

impl Filter {
    /// 원격 호출의 파라미터 이름.
    pub fn param_name(self) -> &'static str {
        match self {
            Filter::AssocClass => "AssocClass",
            Filter::ResultClass => "ResultClass",
            Filter::Role => "Role",
            Filter::ResultRole => "ResultRole",
        }
    }

    /// CLI 옵션 이름.
    pub fn flag(self) -> &'static str {
        match self {
            Filter::AssocClass => "--ac",
            Filter::ResultClass => "--rc",
            Filter::Role => "--role",
            Filter::ResultRole => "--result-role",
        }
    }

    /// 값이 클래스 이름인 필터인지 여부.
    pub fn is_class_name(self) -> bool {
        matches!(self, Filter::AssocClass | Filter::ResultClass)
    }
}

pub type FilterSet = BTreeMap<Filter, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Instance,
    Instances,
    ObjectPaths,
    MethodReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSchema {
    pub target: TargetKind,
    pub filters: &'static [Filter],
    pub accepts_method: bool,
    pub result: ResultKind,
}

const ASSOCIATOR_FILTERS: &[Filter] = &[
    Filter::AssocClass,
    Filter::ResultClass,
    Filter::Role,
    Filter::ResultRole,
];
const REFERENCE_FILTERS: &[Filter] = &[Filter::ResultClass, Filter::Role];
const NO_FILTERS: &[Filter] = &[];

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::GetInstance,
        Operation::EnumerateInstances,
        Operation::EnumerateInstanceNames,
        Operation::Associators,
        Operation::AssociatorNames,
        Operation::References,
        Operation::ReferenceNames,
        Operation::InvokeMethod,
    ];

    /// CLI 서브커맨드 셀렉터.
    pub fn selector(self) -> &'static str {
        match self {
            Operation::GetInstance => "gi",
            Operation::EnumerateInstances => "ei",
            Operation::EnumerateInstanceNames => "en",
            Operation::Associators => "a",
            Operation::AssociatorNames => "an",
            Operation::References => "r",
            Operation::ReferenceNames => "rn",
            Operation::InvokeMethod => "im",
        }
    }

    pub fn from_selector(selector: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.selector() == selector)
    }

    /// 프로토콜 상의 메서드 이름.
    pub fn method_name(self) -> &'static str {
        match self {
            Operation::GetInstance => "GetInstance",
            Operation::EnumerateInstances => "EnumerateInstances",
            Operation::EnumerateInstanceNames => "EnumerateInstanceNames",
            Operation::Associators => "Associators",
            Operation::AssociatorNames => "AssociatorNames",
            Operation::References => "References",
            Operation::ReferenceNames => "ReferenceNames",
            Operation::InvokeMethod => "InvokeMethod",
        }
    }

    pub fn schema(self) -> OperationSchema {
        let (target, filters, accepts_method, result) = match self {
            Operation::GetInstance => (TargetKind::InstancePath, NO_FILTERS, false, ResultKind::Instance),
            Operation::EnumerateInstances => {
                (TargetKind::ClassName, NO_FILTERS, false, ResultKind::Instances)
            }
            Operation::EnumerateInstanceNames => {
                (TargetKind::ClassName, NO_FILTERS, false, ResultKind::ObjectPaths)
            }
            Operation::Associators => (
                TargetKind::InstancePath,
                ASSOCIATOR_FILTERS,
                false,
                ResultKind::Instances,
            ),
            Operation::AssociatorNames => (
                TargetKind::InstancePath,
                ASSOCIATOR_FILTERS,
                false,
                ResultKind::ObjectPaths,
            ),
            Operation::References => (
                TargetKind::InstancePath,
                REFERENCE_FILTERS,
                false,
                ResultKind::Instances,
            ),
            Operation::ReferenceNames => (
                TargetKind::InstancePath,
                REFERENCE_FILTERS,
                false,
                ResultKind::ObjectPaths,
            ),
            Operation::InvokeMethod => (
                TargetKind::MethodTarget,
                NO_FILTERS,
                true,
                ResultKind::MethodReturn,
            ),
        };
        OperationSchema {
            target,
            filters,
            accepts_method,
            result,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// CLI가 해석한 (오퍼레이션, 식별자, 원시 파라미터) 묶음.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: Operation,
    pub identifier: String,
    /// 사용자가 실제로 지정한 필터만 담는다.
    pub filters: Vec<(Filter, String)>,
    pub method: Option<String>,
    pub params: Vec<String>,
}

impl Invocation {
    pub fn new(operation: Operation, identifier: impl Into<String>) -> Self {
        Self {
            operation,
            identifier: identifier.into(),
            filters: Vec::new(),
            method: None,
            params: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter, value: impl Into<String>) -> Self {
        self.filters.push((filter, value.into()));
        self
    }

    /// 스키마에 맞춰 식별자/필터/파라미터를 검증하고 호출 형태를 만든다.
    pub fn into_call(self) -> Result<CimCall> {
        let operation = self.operation;
        let schema = operation.schema();

        let path = match schema.target {
            TargetKind::InstancePath | TargetKind::MethodTarget => literal::decode(&self.identifier)?,
            TargetKind::ClassName => class_target(&self.identifier)?,
        };

        let filters = collect_filters(operation, &schema, self.filters)?;

        if !schema.accepts_method {
            if let Some(method) = &self.method {
                return Err(unexpected(operation, method.clone()));
            }
            if let Some(param) = self.params.first() {
                return Err(unexpected(operation, param.clone()));
            }
        }

        let call = match operation {
            Operation::GetInstance => CimCall::GetInstance { path },
            Operation::EnumerateInstances => CimCall::EnumerateInstances { class: path },
            Operation::EnumerateInstanceNames => CimCall::EnumerateInstanceNames { class: path },
            Operation::Associators => CimCall::Associators { path, filters },
            Operation::AssociatorNames => CimCall::AssociatorNames { path, filters },
            Operation::References => CimCall::References { path, filters },
            Operation::ReferenceNames => CimCall::ReferenceNames { path, filters },
            Operation::InvokeMethod => {
                let method = self
                    .method
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| CimError::MalformedParameter {
                        token: String::new(),
                        reason: "method name is required".to_string(),
                    })?;
                let params = params::marshal(&self.params)?;
                CimCall::InvokeMethod {
                    path,
                    method,
                    params,
                }
            }
        };
        Ok(call)
    }
}

fn unexpected(operation: Operation, argument: String) -> CimError {
    CimError::UnexpectedArgument {
        operation: operation.selector().to_string(),
        argument,
    }
}

fn class_target(identifier: &str) -> Result<ObjectPath> {
    if literal::looks_like_literal(identifier) {
        let path = literal::decode(identifier)?;
        if !path.is_class_path() {
            tracing::warn!(class = %path.class_name, "key bindings ignored for class target");
        }
        return Ok(ObjectPath::new(path.class_name, path.namespace));
    }

    let valid = !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(CimError::malformed_path(identifier, "invalid class name"));
    }
    Ok(ObjectPath::new(identifier, ""))
}

fn collect_filters(
    operation: Operation,
    schema: &OperationSchema,
    raw: Vec<(Filter, String)>,
) -> Result<FilterSet> {
    let mut filters = FilterSet::new();
    for (filter, value) in raw {
        if !schema.filters.contains(&filter) {
            return Err(unexpected(operation, filter.flag().to_string()));
        }
        if value.trim().is_empty() {
            return Err(CimError::MalformedParameter {
                token: format!("{}={value}", filter.flag()),
                reason: "filter value is empty".to_string(),
            });
        }
        filters.insert(filter, value);
    }
    Ok(filters)
}

/// 검증이 끝난 원격 호출 형태. 필터는 지정된 것만 들어 있다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CimCall {
    GetInstance {
        path: ObjectPath,
    },
    EnumerateInstances {
        class: ObjectPath,
    },
    EnumerateInstanceNames {
        class: ObjectPath,
    },
    Associators {
        path: ObjectPath,
        filters: FilterSet,
    },
    AssociatorNames {
        path: ObjectPath,
        filters: FilterSet,
    },
    References {
        path: ObjectPath,
        filters: FilterSet,
    },
    ReferenceNames {
        path: ObjectPath,
        filters: FilterSet,
    },
    InvokeMethod {
        path: ObjectPath,
        method: String,
        params: ParameterSet,
    },
}

impl CimCall {
    pub fn operation(&self) -> Operation {
        match self {
            CimCall::GetInstance { .. } => Operation::GetInstance,
            CimCall::EnumerateInstances { .. } => Operation::EnumerateInstances,
            CimCall::EnumerateInstanceNames { .. } => Operation::EnumerateInstanceNames,
            CimCall::Associators { .. } => Operation::Associators,
            CimCall::AssociatorNames { .. } => Operation::AssociatorNames,
            CimCall::References { .. } => Operation::References,
            CimCall::ReferenceNames { .. } => Operation::ReferenceNames,
            CimCall::InvokeMethod { .. } => Operation::InvokeMethod,
        }
    }
}
