//! CIM 스칼라 값과 정수 폭(width) 규칙.

use std::fmt;
use std::str::FromStr;

use crate::domain::object_path::ObjectPath;

/// 정수 스칼라의 비트 폭.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(IntWidth::W8),
            16 => Some(IntWidth::W16),
            32 => Some(IntWidth::W32),
            64 => Some(IntWidth::W64),
            _ => None,
        }
    }

    /// 부호 없는 정수의 허용 범위 [0, max].
    pub fn unsigned_max(self) -> u64 {
        match self {
            IntWidth::W64 => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }

    /// 부호 있는 정수의 허용 범위 [min, max].
    pub fn signed_range(self) -> (i64, i64) {
        match self {
            IntWidth::W64 => (i64::MIN, i64::MAX),
            w => {
                let half = 1i64 << (w.bits() - 1);
                (-half, half - 1)
            }
        }
    }
}

/// 폭을 벗어난 정수 생성 시도.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRange {
    pub value: i128,
    pub min: i128,
    pub max: i128,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is outside [{}, {}]", self.value, self.min, self.max)
    }
}

/// 폭 검증을 통과한 부호 있는 정수.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedInt {
    width: IntWidth,
    value: i64,
}

impl SignedInt {
    pub fn new(width: IntWidth, value: i128) -> Result<Self, OutOfRange> {
        let (min, max) = width.signed_range();
        if value < i128::from(min) || value > i128::from(max) {
            return Err(OutOfRange {
                value,
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(Self {
            width,
            value: value as i64,
        })
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// 폭 검증을 통과한 부호 없는 정수.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsignedInt {
    width: IntWidth,
    value: u64,
}

impl UnsignedInt {
    pub fn new(width: IntWidth, value: i128) -> Result<Self, OutOfRange> {
        let max = width.unsigned_max();
        if value < 0 || value > i128::from(max) {
            return Err(OutOfRange {
                value,
                min: 0,
                max: max.into(),
            });
        }
        Ok(Self {
            width,
            value: value as u64,
        })
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// 키 바인딩/파라미터 값으로 쓰이는 태그드 유니온.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    String(String),
    Signed(SignedInt),
    Unsigned(UnsignedInt),
    Reference(ObjectPath),
}

impl ScalarValue {
    pub fn string(value: impl Into<String>) -> Self {
        ScalarValue::String(value.into())
    }

    pub fn unsigned(width: IntWidth, value: i128) -> Result<Self, OutOfRange> {
        UnsignedInt::new(width, value).map(ScalarValue::Unsigned)
    }

    pub fn signed(width: IntWidth, value: i128) -> Result<Self, OutOfRange> {
        SignedInt::new(width, value).map(ScalarValue::Signed)
    }

    /// CIM 타입 이름(PARAMTYPE/TYPE 속성 값).
    pub fn cim_type(&self) -> &'static str {
        match self {
            ScalarValue::String(_) => "string",
            ScalarValue::Signed(v) => TypeTag::signed(v.width()).as_str(),
            ScalarValue::Unsigned(v) => TypeTag::unsigned(v.width()).as_str(),
            ScalarValue::Reference(_) => "reference",
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<ObjectPath> for ScalarValue {
    fn from(value: ObjectPath) -> Self {
        ScalarValue::Reference(value)
    }
}

/// `name=type,value` 토큰에서 인식하는 명시적 타입 태그.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Str,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Uint64,
    Sint64,
}

impl TypeTag {
    pub const ALL: [TypeTag; 9] = [
        TypeTag::Str,
        TypeTag::Uint8,
        TypeTag::Sint8,
        TypeTag::Uint16,
        TypeTag::Sint16,
        TypeTag::Uint32,
        TypeTag::Sint32,
        TypeTag::Uint64,
        TypeTag::Sint64,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Str => "str",
            TypeTag::Uint8 => "uint8",
            TypeTag::Sint8 => "sint8",
            TypeTag::Uint16 => "uint16",
            TypeTag::Sint16 => "sint16",
            TypeTag::Uint32 => "uint32",
            TypeTag::Sint32 => "sint32",
            TypeTag::Uint64 => "uint64",
            TypeTag::Sint64 => "sint64",
        }
    }

    pub fn signed(width: IntWidth) -> Self {
        match width {
            IntWidth::W8 => TypeTag::Sint8,
            IntWidth::W16 => TypeTag::Sint16,
            IntWidth::W32 => TypeTag::Sint32,
            IntWidth::W64 => TypeTag::Sint64,
        }
    }

    pub fn unsigned(width: IntWidth) -> Self {
        match width {
            IntWidth::W8 => TypeTag::Uint8,
            IntWidth::W16 => TypeTag::Uint16,
            IntWidth::W32 => TypeTag::Uint32,
            IntWidth::W64 => TypeTag::Uint64,
        }
    }

    /// 정수 태그면 (부호 여부, 폭)을 돌려준다. `str`은 None.
    pub fn integer_shape(self) -> Option<(bool, IntWidth)> {
        match self {
            TypeTag::Str => None,
            TypeTag::Uint8 => Some((false, IntWidth::W8)),
            TypeTag::Sint8 => Some((true, IntWidth::W8)),
            TypeTag::Uint16 => Some((false, IntWidth::W16)),
            TypeTag::Sint16 => Some((true, IntWidth::W16)),
            TypeTag::Uint32 => Some((false, IntWidth::W32)),
            TypeTag::Sint32 => Some((true, IntWidth::W32)),
            TypeTag::Uint64 => Some((false, IntWidth::W64)),
            TypeTag::Sint64 => Some((true, IntWidth::W64)),
        }
    }

    /// 태그에 맞는 정수 스칼라를 만든다. `str` 태그에는 쓰지 않는다.
    pub fn build_integer(self, value: i128) -> Option<Result<ScalarValue, OutOfRange>> {
        let (signed, width) = self.integer_shape()?;
        Some(if signed {
            ScalarValue::signed(width, value)
        } else {
            ScalarValue::unsigned(width, value)
        })
    }
}

impl FromStr for TypeTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ranges_match_bit_counts() {
        assert_eq!(IntWidth::W8.unsigned_max(), 255);
        assert_eq!(IntWidth::W16.unsigned_max(), 65_535);
        assert_eq!(IntWidth::W64.unsigned_max(), u64::MAX);
        assert_eq!(IntWidth::W8.signed_range(), (-128, 127));
        assert_eq!(IntWidth::W32.signed_range(), (i32::MIN as i64, i32::MAX as i64));
    }

    #[test]
    fn construction_rejects_values_outside_width() {
        assert!(ScalarValue::unsigned(IntWidth::W8, 255).is_ok());
        let err = ScalarValue::unsigned(IntWidth::W8, 256).unwrap_err();
        assert_eq!(err.max, 255);
        assert!(ScalarValue::unsigned(IntWidth::W16, -1).is_err());
        assert!(ScalarValue::signed(IntWidth::W8, -128).is_ok());
        assert!(ScalarValue::signed(IntWidth::W8, 128).is_err());
        assert!(ScalarValue::signed(IntWidth::W64, i128::from(i64::MIN) - 1).is_err());
    }

    #[test]
    fn type_tag_parses_only_enumerated_names() {
        assert_eq!("uint16".parse::<TypeTag>(), Ok(TypeTag::Uint16));
        assert_eq!("str".parse::<TypeTag>(), Ok(TypeTag::Str));
        assert!("uint128".parse::<TypeTag>().is_err());
        assert!("string".parse::<TypeTag>().is_err());
    }

    #[test]
    fn cim_type_reflects_width_and_sign() {
        let v = ScalarValue::signed(IntWidth::W16, -3).unwrap();
        assert_eq!(v.cim_type(), "sint16");
        assert_eq!(ScalarValue::string("x").cim_type(), "string");
    }
}
