//! `name=value` 토큰을 타입이 정해진 파라미터로 변환하는 마샬러.
//!
//! 토큰마다 아래 순서로 규칙을 적용한다.
//! 1. 첫 `=`에서 이름/값을 나눈다. `=`이 없으면 `MalformedParameter`.
//! 2. 값이 `{..}`로 감싸져 있으면 오브젝트 패스 리터럴로 디코딩한다.
//! 3. 값이 `<tag>,` 로 시작하고 tag가 `str|uint8|sint8|..|sint64` 중 하나면 그 타입으로 만든다.
//! 4. 값이 10진 숫자로만 이루어져 있으면 uint64로 추론한다.
//! 5. 나머지는 문자열이다.
//!
//! 같은 이름이 다시 나오면 나중 값이 앞의 값을 덮어쓴다.

use std::collections::BTreeMap;

use crate::domain::error::{CimError, Result};
use crate::domain::literal;
use crate::domain::value::{IntWidth, ScalarValue, TypeTag};

/// 호출 1회분의 파라미터 집합(불변 값으로 전달한다).
pub type ParameterSet = BTreeMap<String, ScalarValue>;

/// 토큰 목록 전체를 마샬링한다.
pub fn marshal<S: AsRef<str>>(tokens: &[S]) -> Result<ParameterSet> {
    let mut params = ParameterSet::new();
    for token in tokens {
        let (name, value) = marshal_token(token.as_ref())?;
        if params.insert(name.clone(), value).is_some() {
            tracing::debug!(parameter = %name, "duplicate parameter, last value wins");
        }
    }
    Ok(params)
}

/// 토큰 하나를 (이름, 값)으로 변환한다.
pub fn marshal_token(token: &str) -> Result<(String, ScalarValue)> {
    let Some((name, value)) = token.split_once('=') else {
        return Err(CimError::MalformedParameter {
            token: token.to_string(),
            reason: "expected `name=value`".to_string(),
        });
    };
    if name.is_empty() {
        return Err(CimError::MalformedParameter {
            token: token.to_string(),
            reason: "parameter name is empty".to_string(),
        });
    }

    Ok((name.to_string(), infer_value(token, value)?))
}

fn infer_value(token: &str, value: &str) -> Result<ScalarValue> {
    if literal::looks_like_literal(value) {
        return literal::decode(value).map(ScalarValue::Reference);
    }

    if let Some((prefix, payload)) = value.split_once(',') {
        if let Ok(tag) = prefix.parse::<TypeTag>() {
            return typed_value(token, tag, payload);
        }
        if looks_like_type_tag(prefix) {
            return Err(CimError::ParameterType {
                token: token.to_string(),
                reason: format!("unsupported type tag `{prefix}`"),
            });
        }
    }

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return typed_integer(token, TypeTag::Uint64, value);
    }

    Ok(ScalarValue::string(value))
}

fn typed_value(token: &str, tag: TypeTag, payload: &str) -> Result<ScalarValue> {
    match tag {
        TypeTag::Str => Ok(ScalarValue::string(payload)),
        _ => typed_integer(token, tag, payload),
    }
}

fn typed_integer(token: &str, tag: TypeTag, payload: &str) -> Result<ScalarValue> {
    let text = payload.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CimError::ParameterType {
            token: token.to_string(),
            reason: format!("`{payload}` is not a valid {tag} number"),
        });
    }
    // i128에도 담기지 않는 숫자는 부호 쪽 끝값으로 포화시켜 범위 오류로 보고한다.
    let number = text.parse::<i128>().unwrap_or(if text.starts_with('-') {
        i128::MIN
    } else {
        i128::MAX
    });

    match tag.build_integer(number) {
        Some(Ok(value)) => Ok(value),
        Some(Err(range)) => Err(CimError::ParameterRange {
            token: token.to_string(),
            tag,
            range,
        }),
        None => Ok(ScalarValue::string(payload)),
    }
}

/// `uint24`, `sint128` 같은 오타성 태그를 문자열로 흘려보내지 않기 위한 검사.
fn looks_like_type_tag(prefix: &str) -> bool {
    let Some(bits) = prefix
        .strip_prefix("uint")
        .or_else(|| prefix.strip_prefix("sint"))
    else {
        return false;
    };
    !bits.is_empty()
        && bits.bytes().all(|b| b.is_ascii_digit())
        && bits.parse().ok().and_then(IntWidth::from_bits).is_none()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::object_path::ObjectPath;

    fn one(token: &str) -> Result<ScalarValue> {
        marshal_token(token).map(|(_, v)| v)
    }

    #[test]
    fn explicit_str_tag_beats_numeric_inference() {
        assert_eq!(one("x=str,123").unwrap(), ScalarValue::string("123"));
        assert_eq!(
            one("x=123").unwrap(),
            ScalarValue::unsigned(IntWidth::W64, 123).unwrap()
        );
    }

    #[test]
    fn typed_integers_respect_width() {
        assert_eq!(
            one("Size=uint8,255").unwrap(),
            ScalarValue::unsigned(IntWidth::W8, 255).unwrap()
        );
        assert_eq!(
            one("Delta=sint16,-32768").unwrap(),
            ScalarValue::signed(IntWidth::W16, -32768).unwrap()
        );

        match one("x=uint8,256") {
            Err(CimError::ParameterRange { token, tag, range }) => {
                assert_eq!(token, "x=uint8,256");
                assert_eq!(tag, TypeTag::Uint8);
                assert_eq!((range.min, range.max), (0, 255));
            }
            other => panic!("expected range error, got {other:?}"),
        }
        assert!(matches!(
            one("x=uint32,-1"),
            Err(CimError::ParameterRange { .. })
        ));
    }

    #[test]
    fn numbers_too_long_for_any_width_are_range_errors() {
        let huge = "9".repeat(41);
        for token in [format!("x=uint8,{huge}"), format!("x={huge}"), format!("x=sint64,-{huge}")] {
            match one(&token) {
                Err(CimError::ParameterRange { token: reported, .. }) => assert_eq!(reported, token),
                other => panic!("expected range error for {token}, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_numeric_payload_is_a_type_error() {
        assert!(matches!(
            one("x=uint16,abc"),
            Err(CimError::ParameterType { .. })
        ));
        assert!(matches!(one("x=sint8,"), Err(CimError::ParameterType { .. })));
        assert!(matches!(
            one("x=uint24,5"),
            Err(CimError::ParameterType { .. })
        ));
    }

    #[test]
    fn missing_equals_names_the_token() {
        match one("novaluehere") {
            Err(CimError::MalformedParameter { token, .. }) => assert_eq!(token, "novaluehere"),
            other => panic!("expected MalformedParameter, got {other:?}"),
        }
        assert!(matches!(one("=5"), Err(CimError::MalformedParameter { .. })));
    }

    #[test]
    fn bracketed_values_become_references() {
        let value = one("InPool={classname:'CIM_StoragePool',keybindings:{InstanceID:'P1'},namespace:'root/cimv2'}")
            .unwrap();
        assert_eq!(
            value,
            ScalarValue::Reference(
                ObjectPath::new("CIM_StoragePool", "root/cimv2").with_key("InstanceID", "P1")
            )
        );
        assert!(matches!(
            one("InPool={not-a-path}"),
            Err(CimError::MalformedObjectPath { .. })
        ));
    }

    #[test]
    fn everything_else_is_a_string() {
        assert_eq!(one("Name=vol01").unwrap(), ScalarValue::string("vol01"));
        assert_eq!(one("Name=").unwrap(), ScalarValue::string(""));
        assert_eq!(one("Name=a,b").unwrap(), ScalarValue::string("a,b"));
        assert_eq!(one("Expr=a=b").unwrap(), ScalarValue::string("a=b"));
        assert_eq!(one("Neg=-5").unwrap(), ScalarValue::string("-5"));
    }

    #[test]
    fn duplicate_names_keep_the_last_value() {
        let params = marshal(&["Size=1", "Name=a", "Size=str,2"]).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["Size"], ScalarValue::string("2"));
    }

    #[test]
    fn first_bad_token_aborts_the_set() {
        let err = marshal(&["ok=1", "broken", "x=uint8,999"]).unwrap_err();
        assert!(matches!(err, CimError::MalformedParameter { token, .. } if token == "broken"));
    }
}
