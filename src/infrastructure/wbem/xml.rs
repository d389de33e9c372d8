//! 응답 XML을 작은 엘리먼트 트리로 읽어들이는 파서.

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// 필수 자식 엘리먼트. 없으면 어떤 자식을 찾지 못했는지 알려준다.
    pub fn expect_child(&self, name: &str) -> Result<&Element> {
        self.child(name)
            .with_context(|| format!("<{}> has no <{name}> child", self.name))
    }

    pub fn expect_attr(&self, name: &str) -> Result<&str> {
        self.attr(name)
            .with_context(|| format!("<{}> has no {name} attribute", self.name))
    }
}

/// 문서 전체를 읽어 최상위 엘리먼트를 돌려준다.
pub(crate) fn parse_document(xml: &str) -> Result<Element> {
    // 값의 앞뒤 공백을 보존하려고 텍스트는 다듬지 않는다.
    let mut reader = Reader::from_str(xml);

    // stack[0]은 문서 루트를 담는 가상 엘리먼트.
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(element_from(&start)?),
            Ok(Event::Empty(start)) => {
                let element = element_from(&start)?;
                current(&mut stack)?.children.push(element);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    bail!("unbalanced closing tag at byte {}", reader.buffer_position());
                }
                if let Some(done) = stack.pop() {
                    current(&mut stack)?.children.push(done);
                }
            }
            Ok(Event::Text(text)) => {
                let unescaped = text.unescape().context("invalid text content")?;
                current(&mut stack)?.text.push_str(&unescaped);
            }
            Ok(Event::CData(cdata)) => {
                let raw = cdata.into_inner();
                current(&mut stack)?
                    .text
                    .push_str(&String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => bail!("malformed XML at byte {}: {err}", reader.buffer_position()),
        }
    }

    if stack.len() != 1 {
        bail!("XML document ended with unclosed elements");
    }
    let mut root = stack.remove(0);
    match root.children.len() {
        1 => Ok(root.children.remove(0)),
        0 => bail!("empty XML document"),
        _ => bail!("XML document has more than one root element"),
    }
}

fn current(stack: &mut [Element]) -> Result<&mut Element> {
    stack.last_mut().context("XML element stack is empty")
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.with_context(|| format!("invalid attribute on <{name}>"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .with_context(|| format!("invalid value for {key} on <{name}>"))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}
