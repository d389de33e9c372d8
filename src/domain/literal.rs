//! 오브젝트 패스 리터럴 코덱.
//!
//! 한 개의 셸 토큰으로 넘길 수 있는 구조 리터럴과 [`ObjectPath`] 사이를 변환한다.
//! 입력을 코드로 평가하지 않고, 아래 문법만 재귀 하강으로 해석한다.
//!
//! ```text
//! literal  := object
//! object   := '{' [ member (',' member)* [','] ] '}'
//! member   := key ':' value
//! key      := ident | quoted
//! value    := quoted | integer | tag '(' integer ')' | object | 'None' | 'null' | bare
//! integer  := ['-' | '+'] digit+
//! quoted   := '\'' .. '\'' | '"' .. '"'      (escape: \\ \' \" \n \t \r \;)
//! bare     := 구조 문자(`{}[]():,'"`)와 공백을 제외한 문자열
//! ```
//!
//! 최상위 객체는 `classname`, `namespace`, `keybindings` 세 필드만 정확히 가진다.
//! 디코딩 전에 공백 치환 토큰 [`ESC_SPACE`]를 공백으로 되돌리고, 인코딩은
//! 모든 문자열 값의 공백을 다시 토큰으로 바꿔 공백 없는 한 줄을 만든다.
//! 값 안의 `;`는 `\;`로 적어서 인코딩 결과의 `nbsp;`는 항상 공백 하나를 뜻한다.
//! 인코딩 결과 예: `{classname:'StorageVolume',keybindings:{DeviceID:'1'},namespace:'root/cimv2'}`

use crate::domain::error::{CimError, Result};
use crate::domain::object_path::{KeyBindings, ObjectPath};
use crate::domain::value::{IntWidth, ScalarValue, SignedInt, TypeTag, UnsignedInt};

/// 리터럴 안의 공백을 대신하는 토큰.
pub const ESC_SPACE: &str = "nbsp;";

const FIELD_CLASSNAME: &str = "classname";
const FIELD_NAMESPACE: &str = "namespace";
const FIELD_KEYBINDINGS: &str = "keybindings";

/// 리터럴 문자열을 오브젝트 패스로 해석한다.
pub fn decode(input: &str) -> Result<ObjectPath> {
    let text = input.replace(ESC_SPACE, " ");
    let mut parser = Parser::new(&text);
    let node = parser
        .parse_document()
        .map_err(|reason| CimError::malformed_path(input, reason))?;
    path_from_node(node).map_err(|reason| CimError::malformed_path(input, reason))
}

/// 값이 구조 리터럴 괄호 쌍으로 감싸져 있는지 검사한다.
pub fn looks_like_literal(value: &str) -> bool {
    value.starts_with('{') && value.ends_with('}')
}

/// 오브젝트 패스를 공백 없는 리터럴로 만든다.
pub fn encode(path: &ObjectPath) -> String {
    let mut out = String::new();
    write_path(&mut out, path);
    out
}

fn write_path(out: &mut String, path: &ObjectPath) {
    out.push('{');
    out.push_str(FIELD_CLASSNAME);
    out.push(':');
    write_quoted(out, &path.class_name);
    out.push(',');
    out.push_str(FIELD_KEYBINDINGS);
    out.push_str(":{");
    for (idx, (key, value)) in path.key_bindings.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        write_key(out, key);
        out.push(':');
        write_scalar(out, value);
    }
    out.push_str("},");
    out.push_str(FIELD_NAMESPACE);
    out.push(':');
    write_quoted(out, &path.namespace);
    out.push('}');
}

fn write_key(out: &mut String, key: &str) {
    if is_ident(key) {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}

fn write_scalar(out: &mut String, value: &ScalarValue) {
    match value {
        ScalarValue::String(s) => write_quoted(out, s),
        ScalarValue::Unsigned(v) if v.width() == IntWidth::W64 => {
            out.push_str(&v.value().to_string());
        }
        ScalarValue::Unsigned(v) => {
            out.push_str(&format!("{}({})", TypeTag::unsigned(v.width()), v.value()));
        }
        ScalarValue::Signed(v) => {
            out.push_str(&format!("{}({})", TypeTag::signed(v.width()), v.value()));
        }
        ScalarValue::Reference(path) => write_path(out, path),
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ';' => out.push_str("\\;"),
            ' ' => out.push_str(ESC_SPACE),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | '(' | ')' | ':' | ',' | '\'' | '"')
}

/// 문법 수준의 중간 표현. 의미 검사는 [`path_from_node`]에서 한다.
#[derive(Debug)]
enum Node {
    Str(String),
    Int(i128),
    Typed(TypeTag, i128),
    Object(Vec<(String, Node)>),
    Null,
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Str(_) => "string",
            Node::Int(_) => "integer",
            Node::Typed(..) => "typed integer",
            Node::Object(_) => "structure",
            Node::Null => "null",
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

type ParseResult<T> = std::result::Result<T, String>;

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn parse_document(&mut self) -> ParseResult<Node> {
        self.skip_ws();
        if self.peek() != Some('{') {
            return Err("literal must start with '{'".to_string());
        }
        let node = self.parse_object()?;
        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(format!("unexpected '{c}' after closing '}}' at offset {}", self.pos));
        }
        Ok(node)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> ParseResult<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(format!(
                "expected '{want}' but found '{c}' at offset {}",
                self.pos - 1
            )),
            None => Err(format!("expected '{want}' but input ended")),
        }
    }

    fn parse_object(&mut self) -> ParseResult<Node> {
        self.expect('{')?;
        let mut members = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Node::Object(members));
            }
            let key = self.parse_key()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            members.push((key, value));

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Node::Object(members)),
                Some(c) => {
                    return Err(format!(
                        "expected ',' or '}}' but found '{c}' at offset {}",
                        self.pos - 1
                    ));
                }
                None => return Err("unterminated structure".to_string()),
            }
        }
    }

    fn parse_key(&mut self) -> ParseResult<String> {
        self.skip_ws();
        match self.peek() {
            Some('\'') | Some('"') => self.parse_quoted(),
            Some(_) => {
                let word = self.parse_bare();
                if word.is_empty() || !is_ident(&word) {
                    return Err(format!("invalid key at offset {}", self.pos));
                }
                Ok(word)
            }
            None => Err("expected key but input ended".to_string()),
        }
    }

    fn parse_value(&mut self) -> ParseResult<Node> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('\'') | Some('"') => self.parse_quoted().map(Node::Str),
            Some(c) if is_structural(c) => {
                Err(format!("unexpected '{c}' at offset {}", self.pos))
            }
            Some(_) => self.parse_bare_value(),
            None => Err("expected value but input ended".to_string()),
        }
    }

    fn parse_bare(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !is_structural(c))
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_bare_value(&mut self) -> ParseResult<Node> {
        let word = self.parse_bare();
        self.skip_ws();

        if self.peek() == Some('(') {
            let tag: TypeTag = word
                .parse()
                .map_err(|_| format!("unknown type tag `{word}`"))?;
            if tag == TypeTag::Str {
                return Err("`str(..)` is not a typed integer; quote the string instead".to_string());
            }
            self.pos += 1;
            self.skip_ws();
            let digits = self.parse_bare();
            let value = parse_integer(&digits)
                .ok_or_else(|| format!("`{tag}(..)` needs an integer, found `{digits}`"))?;
            self.expect(')')?;
            return Ok(Node::Typed(tag, value));
        }

        if word == "None" || word == "null" {
            return Ok(Node::Null);
        }
        if let Some(value) = parse_integer(&word) {
            return Ok(Node::Int(value));
        }
        Ok(Node::Str(word))
    }

    fn parse_quoted(&mut self) -> ParseResult<String> {
        let quote = self.bump().ok_or("expected quote")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"' | ';')) => out.push(c),
                    Some(c) => return Err(format!("unknown escape '\\{c}'")),
                    None => return Err("unterminated escape".to_string()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }
}

fn parse_integer(text: &str) -> Option<i128> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn path_from_node(node: Node) -> ParseResult<ObjectPath> {
    let members = match node {
        Node::Object(members) => members,
        other => return Err(format!("expected structure, found {}", other.kind())),
    };

    let mut class_name = None;
    let mut namespace = None;
    let mut key_bindings = None;

    for (field, value) in members {
        let slot_taken = match field.as_str() {
            FIELD_CLASSNAME => class_name.replace(value).is_some(),
            FIELD_NAMESPACE => namespace.replace(value).is_some(),
            FIELD_KEYBINDINGS => key_bindings.replace(value).is_some(),
            other => return Err(format!("unknown field `{other}`")),
        };
        if slot_taken {
            return Err(format!("duplicate field `{field}`"));
        }
    }

    let class_name = match class_name {
        Some(Node::Str(s)) if !s.is_empty() => s,
        Some(Node::Str(_)) => return Err("`classname` must not be empty".to_string()),
        Some(other) => return Err(format!("`classname` must be a string, found {}", other.kind())),
        None => return Err("missing field `classname`".to_string()),
    };

    let namespace = match namespace {
        Some(Node::Str(s)) => s,
        Some(Node::Null) => String::new(),
        Some(other) => return Err(format!("`namespace` must be a string, found {}", other.kind())),
        None => return Err("missing field `namespace`".to_string()),
    };

    let key_bindings = match key_bindings {
        Some(Node::Object(members)) => bindings_from_members(members)?,
        Some(other) => {
            return Err(format!("`keybindings` must be a structure, found {}", other.kind()));
        }
        None => return Err("missing field `keybindings`".to_string()),
    };

    Ok(ObjectPath {
        class_name,
        namespace,
        key_bindings,
    })
}

fn bindings_from_members(members: Vec<(String, Node)>) -> ParseResult<KeyBindings> {
    let mut bindings = KeyBindings::new();
    for (key, node) in members {
        if bindings.contains_key(&key) {
            return Err(format!("duplicate key binding `{key}`"));
        }
        let value = scalar_from_node(&key, node)?;
        bindings.insert(key, value);
    }
    Ok(bindings)
}

fn scalar_from_node(key: &str, node: Node) -> ParseResult<ScalarValue> {
    match node {
        Node::Str(s) => Ok(ScalarValue::String(s)),
        Node::Int(v) if v < 0 => SignedInt::new(IntWidth::W64, v)
            .map(ScalarValue::Signed)
            .map_err(|e| format!("key binding `{key}`: {e}")),
        Node::Int(v) => UnsignedInt::new(IntWidth::W64, v)
            .map(ScalarValue::Unsigned)
            .map_err(|e| format!("key binding `{key}`: {e}")),
        Node::Typed(tag, v) => match tag.build_integer(v) {
            Some(built) => built.map_err(|e| format!("key binding `{key}`: {tag} {e}")),
            None => Err(format!("key binding `{key}`: `{tag}` is not an integer tag")),
        },
        Node::Object(_) => path_from_node(node)
            .map(ScalarValue::Reference)
            .map_err(|e| format!("key binding `{key}`: {e}")),
        Node::Null => Err(format!("key binding `{key}` must not be null")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage_volume() -> ObjectPath {
        ObjectPath::new("StorageVolume", "root/cimv2").with_key("DeviceID", "1")
    }

    #[test]
    fn decodes_canonical_literal() {
        let path = decode("{classname:'StorageVolume',keybindings:{DeviceID:'1'},namespace:'root/cimv2'}")
            .unwrap();
        assert_eq!(path, storage_volume());
    }

    #[test]
    fn decodes_legacy_quoted_field_form() {
        let path = decode(
            "{'keybindings':{'DeviceID':'1'},'namespace':'root/cimv2','classname':'StorageVolume'}",
        )
        .unwrap();
        assert_eq!(path, storage_volume());
    }

    #[test]
    fn decodes_bare_words_and_whitespace_between_tokens() {
        let path = decode("{ classname: StorageVolume, keybindings: { DeviceID: \"1\" }, namespace: root/cimv2 }")
            .unwrap();
        assert_eq!(path, storage_volume());
    }

    #[test]
    fn encodes_without_any_space() {
        let path = ObjectPath::new("CIM_StorageVolume", "root/cimv2")
            .with_key("ElementName", "Volume 01  tier a");
        let encoded = encode(&path);
        assert!(!encoded.contains(' '), "{encoded}");
        assert_eq!(
            encoded,
            "{classname:'CIM_StorageVolume',keybindings:{ElementName:'Volumenbsp;01nbsp;nbsp;tiernbsp;a'},namespace:'root/cimv2'}"
        );
        assert_eq!(decode(&encoded).unwrap(), path);
    }

    #[test]
    fn values_containing_the_space_token_round_trip() {
        let path = ObjectPath::new("X", "")
            .with_key("K", "anbsp;b")
            .with_key("L", "\nbsp; x;y");
        let encoded = encode(&path);
        assert!(encoded.contains("K:'anbsp\\;b'"), "{encoded}");
        assert!(!encoded.contains(' '), "{encoded}");
        assert_eq!(decode(&encoded).unwrap(), path);
    }

    #[test]
    fn round_trips_nested_and_typed_bindings() {
        let inner = ObjectPath::new("CIM_System", "").with_key("Name", "array-1");
        let path = ObjectPath::new("CIM_Component", "interop")
            .with_key("Group", inner)
            .with_key("Slot", ScalarValue::unsigned(IntWidth::W16, 7).unwrap())
            .with_key("Offset", ScalarValue::signed(IntWidth::W64, 12).unwrap())
            .with_key("Serial", ScalarValue::unsigned(IntWidth::W64, 9_000_000_000).unwrap())
            .with_key("Quote's \"mixed\"\\path", "tab\there");
        let encoded = encode(&path);
        assert!(!encoded.chars().any(char::is_whitespace), "{encoded}");
        assert_eq!(decode(&encoded).unwrap(), path);
    }

    #[test]
    fn empty_keybindings_is_a_class_path() {
        let path = decode("{classname:'CIM_StorageVolume',keybindings:{},namespace:''}").unwrap();
        assert!(path.is_class_path());
        assert_eq!(path.namespace, "");
        assert_eq!(decode(&encode(&path)).unwrap(), path);
    }

    #[test]
    fn null_namespace_decodes_as_empty() {
        let path = decode("{'classname':'X','keybindings':{},'namespace':None}").unwrap();
        assert_eq!(path.namespace, "");
    }

    #[test]
    fn bare_integer_bindings_are_64_bit() {
        let path = decode("{classname:X,keybindings:{A:5,B:-5},namespace:ns}").unwrap();
        assert_eq!(
            path.key_bindings["A"],
            ScalarValue::unsigned(IntWidth::W64, 5).unwrap()
        );
        assert_eq!(
            path.key_bindings["B"],
            ScalarValue::signed(IntWidth::W64, -5).unwrap()
        );
    }

    fn reason_of(input: &str) -> String {
        match decode(input) {
            Err(CimError::MalformedObjectPath { input: echoed, reason }) => {
                assert_eq!(echoed, input);
                reason
            }
            other => panic!("expected MalformedObjectPath, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(reason_of("{classname:'X',keybindings:{}}").contains("namespace"));
        assert!(reason_of("{namespace:'n',keybindings:{}}").contains("classname"));
        assert!(reason_of("{classname:'X',namespace:'n'}").contains("keybindings"));
    }

    #[test]
    fn rejects_wrong_shapes_and_extra_fields() {
        assert!(reason_of("{classname:{},keybindings:{},namespace:'n'}").contains("classname"));
        assert!(reason_of("{classname:'X',keybindings:'k',namespace:'n'}").contains("keybindings"));
        assert!(reason_of("{classname:'X',keybindings:{},namespace:'n',host:'h'}").contains("host"));
        assert!(reason_of("{classname:'X',classname:'Y',keybindings:{},namespace:''}").contains("duplicate"));
        assert!(reason_of("{classname:'',keybindings:{},namespace:''}").contains("empty"));
        assert!(reason_of("{classname:'X',keybindings:{A:'1',A:'2'},namespace:''}").contains("duplicate"));
    }

    #[test]
    fn rejects_unparsable_text() {
        reason_of("StorageVolume");
        reason_of("{classname:'X'");
        reason_of("{classname:'X',keybindings:{},namespace:'n'} trailing");
        reason_of("{classname:'unterminated,keybindings:{},namespace:'n'}");
        reason_of("{classname:'X',keybindings:{A:uint8(300)},namespace:''}");
        reason_of("{classname:'X',keybindings:{A:uint9(1)},namespace:''}");
        reason_of("{__import__('os'):1}");
    }
}
