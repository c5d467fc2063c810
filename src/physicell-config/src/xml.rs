// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! A small, lossless XML tree built on `quick-xml` events.
//!
//! Every node keeps its raw (escaped) source text, and every element keeps
//! its raw start tag until one of its attributes is changed. Serializing an
//! unmodified tree therefore reproduces the input byte-for-byte, and
//! modifying one leaf leaves the bytes of every other node alone.

use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::load_err;

type XmlWriter = Cursor<Vec<u8>>;

fn xml_error(err: std::io::Error) -> Error {
    Error::new(
        ErrorKind::Load,
        ErrorCode::XmlSerialization,
        Some(err.to_string()),
    )
}

fn utf8(bytes: &[u8]) -> Result<String> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(err) => load_err!(XmlDeserialization, err.to_string()),
    }
}

fn unescape_raw(raw: &str) -> Result<String> {
    match unescape(raw) {
        Ok(value) => Ok(value.into_owned()),
        Err(err) => load_err!(XmlDeserialization, format!("{err} in '{raw}'")),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
    raw_value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    raw: String,
    value: String,
}

impl Text {
    fn from_raw(raw: String) -> Result<Self> {
        let value = unescape_raw(&raw)?;
        Ok(Text { raw, value })
    }

    fn from_value(value: &str) -> Self {
        Text {
            raw: partial_escape(value).into_owned(),
            value: value.to_owned(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_whitespace(&self) -> bool {
        self.value.chars().all(char::is_whitespace)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Decl(String),
    DocType(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    // content between `<` and `>` as read; dropped once an attribute changes
    raw_start: Option<String>,
    self_closing: bool,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_owned(),
            attributes: vec![],
            raw_start: None,
            self_closing: true,
            children: vec![],
        }
    }

    fn from_start(start: &BytesStart, self_closing: bool) -> Result<Self> {
        let name = utf8(start.name().as_ref())?;
        let raw_start = utf8(start)?;

        let mut attributes = vec![];
        for attr in start.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    return load_err!(XmlDeserialization, format!("<{name}>: {err}"));
                }
            };
            let raw_value = utf8(&attr.value)?;
            attributes.push(Attribute {
                key: utf8(attr.key.as_ref())?,
                value: unescape_raw(&raw_value)?,
                raw_value,
            });
        }

        Ok(Element {
            name,
            attributes,
            raw_start: Some(raw_start),
            self_closing,
            children: vec![],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        let raw_value = escape(value).into_owned();
        match self.attributes.iter_mut().find(|attr| attr.key == key) {
            Some(attr) => {
                attr.value = value.to_owned();
                attr.raw_value = raw_value;
            }
            None => self.attributes.push(Attribute {
                key: key.to_owned(),
                value: value.to_owned(),
                raw_value,
            }),
        }
        self.raw_start = None;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order, paired with their index in
    /// `children()`.
    pub fn elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el) => Some((i, el)),
                _ => None,
            })
    }

    pub fn element_at(&self, index: usize) -> Option<&Element> {
        match self.children.get(index) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Concatenated text and CDATA content of this element's direct children.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in self.children.iter() {
            match node {
                Node::Text(t) => text.push_str(t.value()),
                Node::CData(data) => text.push_str(data),
                _ => (),
            }
        }
        text
    }

    /// Replaces the text content in place: the first text node takes the new
    /// value and any other text or CDATA children are dropped. Child
    /// elements and comments stay where they are.
    pub fn set_text(&mut self, value: &str) {
        let first = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Text(_) | Node::CData(_)));
        match first {
            Some(pos) => {
                self.children[pos] = Node::Text(Text::from_value(value));
                let mut i = 0;
                self.children.retain(|node| {
                    let keep = i <= pos || !matches!(node, Node::Text(_) | Node::CData(_));
                    i += 1;
                    keep
                });
            }
            None => self.children.insert(0, Node::Text(Text::from_value(value))),
        }
        self.self_closing = false;
    }

    pub fn insert_child(&mut self, index: usize, node: Node) {
        self.children.insert(index, node);
        self.self_closing = false;
    }

    pub fn remove_child(&mut self, index: usize) -> Node {
        self.children.remove(index)
    }

    pub fn push_child(&mut self, node: Node) {
        self.children.push(node);
        self.self_closing = false;
    }

    fn push_parsed(&mut self, node: Node) -> Result<()> {
        push_merging_text(&mut self.children, node)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_xml(&mut writer)?;
        writer_into_string(writer)
    }

    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let start = match self.raw_start {
            Some(ref raw) => BytesStart::from_content(raw.as_str(), self.name.len()),
            None => {
                let mut start = BytesStart::new(self.name.as_str());
                for attr in self.attributes.iter() {
                    // rebuilt tags are double-quoted; a raw value read from a
                    // single-quoted attribute may hold a literal `"`
                    let value = if attr.raw_value.contains('"') {
                        Cow::Owned(escape(attr.value.as_str()).into_owned().into_bytes())
                    } else {
                        Cow::Borrowed(attr.raw_value.as_bytes())
                    };
                    start.push_attribute(XmlAttribute {
                        key: QName(attr.key.as_bytes()),
                        value,
                    });
                }
                start
            }
        };

        if self.self_closing && self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_error);
        }

        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        for child in self.children.iter() {
            write_node(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_error)
    }
}

fn push_merging_text(nodes: &mut Vec<Node>, node: Node) -> Result<()> {
    if let Node::Text(ref text) = node {
        if let Some(Node::Text(prev)) = nodes.last_mut() {
            let raw = format!("{}{}", prev.raw, text.raw);
            *prev = Text::from_raw(raw)?;
            return Ok(());
        }
    }
    nodes.push(node);
    Ok(())
}

fn write_node(writer: &mut Writer<XmlWriter>, node: &Node) -> Result<()> {
    let event = match node {
        Node::Element(el) => return el.write_xml(writer),
        Node::Text(text) => Event::Text(BytesText::from_escaped(text.raw.as_str())),
        Node::CData(data) => Event::CData(BytesCData::new(data.as_str())),
        Node::Comment(raw) => Event::Comment(BytesText::from_escaped(raw.as_str())),
        Node::ProcessingInstruction(raw) => Event::PI(BytesPI::new(raw.as_str())),
        Node::Decl(raw) => Event::Decl(BytesDecl::from_start(BytesStart::from_content(
            raw.as_str(),
            3,
        ))),
        Node::DocType(raw) => Event::DocType(BytesText::from_escaped(raw.as_str())),
    };
    writer.write_event(event).map_err(xml_error)
}

fn writer_into_string(writer: Writer<XmlWriter>) -> Result<String> {
    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|_err| {
        Error::new(
            ErrorKind::Load,
            ErrorCode::XmlSerialization,
            Some("problem converting to UTF-8".to_owned()),
        )
    })
}

/// A parsed document: whatever precedes the root element (declaration,
/// comments, whitespace), the root itself, and whatever follows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    pub fn parse(source: &str) -> Result<Document> {
        let mut reader = Reader::from_str(source);

        let mut prolog: Vec<Node> = vec![];
        let mut epilog: Vec<Node> = vec![];
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = vec![];

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return load_err!(
                        XmlDeserialization,
                        format!("at byte {}: {}", reader.buffer_position(), err)
                    );
                }
            };

            let node = match event {
                Event::Start(ref e) => {
                    stack.push(Element::from_start(e, false)?);
                    continue;
                }
                Event::End(_) => match stack.pop() {
                    Some(el) => Node::Element(el),
                    None => return load_err!(XmlDeserialization, "unbalanced end tag".to_owned()),
                },
                Event::Empty(ref e) => Node::Element(Element::from_start(e, true)?),
                Event::Text(ref e) => Node::Text(Text::from_raw(utf8(e)?)?),
                Event::GeneralRef(ref e) => Node::Text(Text::from_raw(format!("&{};", utf8(e)?))?),
                Event::CData(ref e) => Node::CData(utf8(e)?),
                Event::Comment(ref e) => Node::Comment(utf8(e)?),
                Event::PI(ref e) => Node::ProcessingInstruction(utf8(e)?),
                Event::Decl(ref e) => Node::Decl(utf8(e)?),
                Event::DocType(ref e) => Node::DocType(utf8(e)?),
                Event::Eof => break,
            };

            if let Some(parent) = stack.last_mut() {
                parent.push_parsed(node)?;
                continue;
            }

            match node {
                Node::Element(el) => {
                    if root.is_some() {
                        return load_err!(
                            XmlDeserialization,
                            format!("second root element <{}>", el.name)
                        );
                    }
                    root = Some(el);
                }
                node if root.is_none() => push_merging_text(&mut prolog, node)?,
                node => push_merging_text(&mut epilog, node)?,
            }
        }

        if let Some(el) = stack.last() {
            return load_err!(XmlDeserialization, format!("unclosed element <{}>", el.name));
        }

        match root {
            Some(root) => Ok(Document {
                prolog,
                root,
                epilog,
            }),
            None => load_err!(XmlDeserialization, "document has no root element".to_owned()),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        for node in self.prolog.iter() {
            write_node(&mut writer, node)?;
        }
        self.root.write_xml(&mut writer)?;
        for node in self.epilog.iter() {
            write_node(&mut writer, node)?;
        }
        writer_into_string(writer)
    }
}

#[cfg(test)]
const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- sample -->
<settings version='1.2'>
	<domain>
		<x_min>-500</x_min>
		<note>a &amp; b &lt; c</note>
		<empty />
		<![CDATA[raw <text>]]>
	</domain>
	<?keep this?>
</settings>
"#;

#[test]
fn test_unmodified_roundtrip_is_exact() {
    let doc = Document::parse(SAMPLE).unwrap();
    assert_eq!(SAMPLE, doc.to_xml_string().unwrap());
}

#[test]
fn test_text_and_attributes_are_unescaped() {
    let doc = Document::parse(SAMPLE).unwrap();
    let root = doc.root();
    assert_eq!("settings", root.name());
    assert_eq!(Some("1.2"), root.attribute("version"));
    assert_eq!(None, root.attribute("missing"));

    let (_, domain) = root.elements().next().unwrap();
    let names: Vec<&str> = domain.elements().map(|(_, el)| el.name()).collect();
    assert_eq!(vec!["x_min", "note", "empty"], names);

    let (_, note) = domain.elements().nth(1).unwrap();
    assert_eq!("a & b < c", note.text());
}

#[test]
fn test_set_text_only_touches_target() {
    let mut doc = Document::parse(SAMPLE).unwrap();
    {
        let domain = doc.root_mut().element_at_mut(1).unwrap();
        let x_min = domain.element_at_mut(1).unwrap();
        x_min.set_text("-200");
    }
    let out = doc.to_xml_string().unwrap();
    assert_eq!(SAMPLE.replace("-500", "-200"), out);
}

#[test]
fn test_set_text_on_self_closing_element() {
    let mut doc = Document::parse("<a><b/></a>").unwrap();
    doc.root_mut().element_at_mut(0).unwrap().set_text("1 < 2");
    assert_eq!("<a><b>1 &lt; 2</b></a>", doc.to_xml_string().unwrap());
}

#[test]
fn test_set_attribute_rewrites_start_tag() {
    let mut doc = Document::parse("<a><b  code='6' name=\"x\">t</b></a>").unwrap();
    let b = doc.root_mut().element_at_mut(0).unwrap();
    b.set_attribute("code", "5");
    assert_eq!(Some("5"), b.attribute("code"));
    assert_eq!(
        "<a><b code=\"5\" name=\"x\">t</b></a>",
        doc.to_xml_string().unwrap()
    );
}

#[test]
fn test_rebuilt_start_tag_requotes_untouched_attributes() {
    let mut doc = Document::parse(r#"<a><cycle code="5" name='live "fast"'/></a>"#).unwrap();
    doc.root_mut()
        .element_at_mut(0)
        .unwrap()
        .set_attribute("code", "7");
    let out = doc.to_xml_string().unwrap();
    assert_eq!(
        r#"<a><cycle code="7" name="live &quot;fast&quot;"/></a>"#,
        out
    );

    let reparsed = Document::parse(&out).unwrap();
    let cycle = reparsed.root().element_at(0).unwrap();
    assert_eq!(Some("7"), cycle.attribute("code"));
    assert_eq!(Some("live \"fast\""), cycle.attribute("name"));
}

#[test]
fn test_parse_errors() {
    let err = Document::parse("<a><b></a>").unwrap_err();
    assert_eq!(ErrorKind::Load, err.kind);

    let err = Document::parse("<!-- nothing -->").unwrap_err();
    assert_eq!(ErrorCode::XmlDeserialization, err.code);

    let err = Document::parse("<a></a><b></b>").unwrap_err();
    assert_eq!(ErrorKind::Load, err.kind);
}
