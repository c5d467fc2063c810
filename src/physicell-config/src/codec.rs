// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Field codecs: decode a resolved element into a flat map of typed field
//! values, and apply a (possibly partial) map of values back onto it.

use std::collections::BTreeMap;

use log::trace;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::field_err;
use crate::path::ElementPath;
use crate::xml::{Element, Node, Text};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Bool,
    Text,
    FloatList,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// An attribute on the resolved element.
    Attribute(&'static str),
    /// The text of a unique descendant; `""` is the element itself.
    Text(&'static str),
    /// The resolved element's own tag name.
    TagName,
    /// Texts of every `item` child of the unique descendant `parent`.
    Repeated {
        parent: &'static str,
        item: &'static str,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub source: Source,
    pub required: bool,
}

impl FieldSpec {
    pub const fn float(name: &'static str, path: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Float,
            source: Source::Text(path),
            required: true,
        }
    }

    pub const fn boolean(name: &'static str, path: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Bool,
            source: Source::Text(path),
            required: true,
        }
    }

    pub const fn text(name: &'static str, path: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Text,
            source: Source::Text(path),
            required: true,
        }
    }

    pub const fn attribute(name: &'static str, kind: FieldKind, attr: &'static str) -> Self {
        FieldSpec {
            name,
            kind,
            source: Source::Attribute(attr),
            required: true,
        }
    }

    pub const fn tag_name(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Text,
            source: Source::TagName,
            required: true,
        }
    }

    pub const fn optional_list(
        name: &'static str,
        parent: &'static str,
        item: &'static str,
    ) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::FloatList,
            source: Source::Repeated { parent, item },
            required: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Float(f64),
    Bool(bool),
    Text(String),
    FloatList(Vec<f64>),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Float(_) => FieldKind::Float,
            Value::Bool(_) => FieldKind::Bool,
            Value::Text(_) => FieldKind::Text,
            Value::FloatList(_) => FieldKind::FloatList,
        }
    }
}

/// Field name to value. A field that is absent is null.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(BTreeMap<&'static str, Value>);

impl Fields {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.0.insert(name, value);
    }

    pub fn with(mut self, name: &'static str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(Value::Float(v)) => Ok(*v),
            Some(_) => field_err!(FieldKindMismatch, format!("{name}: expected a float")),
            None => field_err!(MissingField, name.to_owned()),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(Value::Bool(v)) => Ok(*v),
            Some(_) => field_err!(FieldKindMismatch, format!("{name}: expected a bool")),
            None => field_err!(MissingField, name.to_owned()),
        }
    }

    pub fn text(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::Text(v)) => Ok(v.clone()),
            Some(_) => field_err!(FieldKindMismatch, format!("{name}: expected text")),
            None => field_err!(MissingField, name.to_owned()),
        }
    }

    pub fn float_list(&self, name: &str) -> Result<Option<Vec<f64>>> {
        match self.get(name) {
            Some(Value::FloatList(v)) => Ok(Some(v.clone())),
            Some(_) => field_err!(FieldKindMismatch, format!("{name}: expected a list")),
            None => Ok(None),
        }
    }
}

pub fn parse_float(s: &str) -> Result<f64> {
    match s.trim().parse::<f64>() {
        Ok(v) => Ok(v),
        Err(_) => field_err!(ExpectedNumber, format!("'{s}'")),
    }
}

pub fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim();
    if s == "1" || s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s == "0" || s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        field_err!(ExpectedBool, format!("'{s}'"))
    }
}

pub fn format_float(v: f64) -> String {
    format!("{v}")
}

fn format_bool(v: bool) -> &'static str {
    if v { "true" } else { "false" }
}

fn parse_value(kind: FieldKind, s: &str) -> Result<Value> {
    Ok(match kind {
        FieldKind::Float => Value::Float(parse_float(s)?),
        FieldKind::Bool => Value::Bool(parse_bool(s)?),
        FieldKind::Text => Value::Text(s.trim().to_owned()),
        FieldKind::FloatList => Value::FloatList(
            s.split_whitespace()
                .map(parse_float)
                .collect::<Result<Vec<f64>>>()?,
        ),
    })
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Float(v) => format_float(*v),
        Value::Bool(v) => format_bool(*v).to_owned(),
        Value::Text(v) => v.clone(),
        Value::FloatList(vs) => vs
            .iter()
            .map(|v| format_float(*v))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Finds a unique descendant, or None if there is none. Several matches are
/// an error even for optional fields.
fn find<'a>(node: &'a Element, path: &str) -> Result<Option<&'a Element>> {
    let path = ElementPath::parse(path)?;
    let mut matches = path.resolve_all(node);
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        _ => path.resolve(node).map(Some),
    }
}

fn items<'a>(parent: &'a Element, item: &str) -> Vec<(usize, &'a Element)> {
    parent.elements().filter(|(_, el)| el.name() == item).collect()
}

fn read_source(node: &Element, spec: &FieldSpec) -> Result<Option<Value>> {
    let context = |err: Error| annotate(err, spec.name);
    match spec.source {
        Source::Attribute(attr) => node
            .attribute(attr)
            .map(|s| parse_value(spec.kind, s).map_err(context))
            .transpose(),
        Source::Text(path) => match find(node, path)? {
            Some(el) => parse_value(spec.kind, &el.text()).map(Some).map_err(context),
            None => Ok(None),
        },
        Source::TagName => Ok(Some(Value::Text(node.name().to_owned()))),
        Source::Repeated { parent, item } => match find(node, parent)? {
            Some(parent) => {
                let values = items(parent, item)
                    .into_iter()
                    .map(|(_, el)| parse_float(&el.text()))
                    .collect::<Result<Vec<f64>>>()
                    .map_err(context)?;
                Ok(Some(Value::FloatList(values)))
            }
            None => Ok(None),
        },
    }
}

fn annotate(mut err: Error, field: &str) -> Error {
    err.details = Some(match err.details {
        Some(details) => format!("{field}: {details}"),
        None => field.to_owned(),
    });
    err
}

pub fn decode(node: &Element, specs: &[FieldSpec]) -> Result<Fields> {
    let mut fields = Fields::new();
    for spec in specs.iter() {
        match read_source(node, spec)? {
            Some(value) => fields.insert(spec.name, value),
            None if spec.required => {
                return field_err!(MissingField, format!("{} in <{}>", spec.name, node.name()));
            }
            None => (),
        }
    }
    Ok(fields)
}

/// Applies `fields` to `node`. Fields not present in the map are left
/// alone, as is any value that already decodes to the requested one.
pub fn encode(node: &mut Element, specs: &[FieldSpec], fields: &Fields) -> Result<()> {
    for (name, value) in fields.iter() {
        let Some(spec) = specs.iter().find(|spec| spec.name == name) else {
            return field_err!(UnknownField, name.to_owned());
        };
        if spec.kind != value.kind() {
            return field_err!(FieldKindMismatch, format!("{name}: got {:?}", value.kind()));
        }

        // unparseable current values are simply overwritten
        let current = read_source(node, spec).ok().flatten();
        if current.as_ref() == Some(value) {
            continue;
        }

        write_source(node, spec, value)?;
    }
    Ok(())
}

fn write_source(node: &mut Element, spec: &FieldSpec, value: &Value) -> Result<()> {
    match spec.source {
        Source::Attribute(attr) => {
            let text = format_scalar(value);
            trace!("<{}> @{} = {}", node.name(), attr, text);
            node.set_attribute(attr, &text);
        }
        Source::Text(path) => {
            let path = ElementPath::parse(path)?;
            let target = path.resolve_mut(node).map_err(|err| missing_target(err, spec.name))?;
            let text = format_scalar(value);
            trace!("<{}> = {}", target.name(), text);
            target.set_text(&text);
        }
        Source::TagName => {
            if let Value::Text(ref name) = *value {
                if name != node.name() {
                    return field_err!(
                        InvalidValue,
                        format!("cannot rename <{}> to <{}>", node.name(), name)
                    );
                }
            }
        }
        Source::Repeated { parent, item } => {
            let Value::FloatList(ref values) = *value else {
                return field_err!(FieldKindMismatch, spec.name.to_owned());
            };
            let path = ElementPath::parse(parent)?;
            let parent_el = path
                .resolve_mut(node)
                .map_err(|err| missing_target(err, spec.name))?;
            write_list(parent_el, item, values);
        }
    }
    Ok(())
}

/// A write target that does not exist is a missing field; several matches
/// stay Ambiguous.
fn missing_target(err: Error, field: &str) -> Error {
    match err.kind {
        ErrorKind::NotFound => Error::new(
            ErrorKind::MalformedField,
            ErrorCode::MissingField,
            Some(format!("{field}: {err}")),
        ),
        _ => annotate(err, field),
    }
}

fn leading_whitespace(parent: &Element, index: usize) -> Option<Text> {
    let prev = index.checked_sub(1)?;
    match parent.children().get(prev) {
        Some(Node::Text(t)) if t.is_whitespace() => Some(t.clone()),
        _ => None,
    }
}

/// Rewrites the `item` children of `parent` so that they hold `values`,
/// overwriting in place and then appending or removing items at the end.
fn write_list(parent: &mut Element, item: &str, values: &[f64]) {
    let existing: Vec<usize> = items(parent, item).into_iter().map(|(i, _)| i).collect();

    for (&i, v) in existing.iter().zip(values.iter()) {
        if let Some(el) = parent.element_at_mut(i) {
            let text = format_float(*v);
            if parse_float(&el.text()).ok() != Some(*v) {
                trace!("<{}>[{}] = {}", item, i, text);
                el.set_text(&text);
            }
        }
    }

    if values.len() < existing.len() {
        // remove from the back so earlier indices stay valid
        for &i in existing[values.len()..].iter().rev() {
            let indent = leading_whitespace(parent, i);
            parent.remove_child(i);
            if indent.is_some() {
                parent.remove_child(i - 1);
            }
        }
        return;
    }

    let template = existing
        .last()
        .and_then(|&i| parent.element_at(i).cloned())
        .unwrap_or_else(|| Element::new(item));
    let indent = existing.last().and_then(|&i| leading_whitespace(parent, i));
    let mut insert_at = existing.last().map(|&i| i + 1).unwrap_or(parent.children().len());

    for (n, v) in values.iter().enumerate().skip(existing.len()) {
        let mut el = template.clone();
        if el.attribute("index").is_some() {
            el.set_attribute("index", &n.to_string());
        }
        el.set_text(&format_float(*v));
        trace!("<{}>[{}] appended = {}", item, n, v);
        if let Some(ref indent) = indent {
            parent.insert_child(insert_at, Node::Text(indent.clone()));
            insert_at += 1;
        }
        parent.insert_child(insert_at, Node::Element(el));
        insert_at += 1;
    }
}

#[cfg(test)]
use crate::xml::Document;

#[cfg(test)]
const CYCLE: &str = r#"<cycle code="6" name="Flow cytometry model (separated)">
    <!-- durations -->
    <phase_durations units="min">
        <duration index="0" fixed_duration="false">300.0</duration>
        <duration index="1" fixed_duration="true">480</duration>
        <duration index="2" fixed_duration="true">240</duration>
        <duration index="3" fixed_duration="true">60</duration>
    </phase_durations>
    <enabled>1</enabled>
    <bias>.5</bias>
</cycle>"#;

#[cfg(test)]
const CYCLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::attribute("code", FieldKind::Float, "code"),
    FieldSpec::attribute("label", FieldKind::Text, "name"),
    FieldSpec::optional_list("phase_durations", "phase_durations", "duration"),
    FieldSpec::optional_list("phase_transition_rates", "phase_transition_rates", "rate"),
    FieldSpec::boolean("enabled", "enabled"),
    FieldSpec::float("bias", "bias"),
];

#[test]
fn test_parse_scalars() {
    assert_eq!(0.5, parse_float(".5").unwrap());
    assert_eq!(0.0166667, parse_float(" 1.66667e-02\n").unwrap());
    assert_eq!(-500.0, parse_float("-500").unwrap());
    assert!(parse_float("1,5").is_err());
    assert!(parse_float("").is_err());

    assert!(parse_bool("true").unwrap());
    assert!(parse_bool("TRUE").unwrap());
    assert!(parse_bool("1").unwrap());
    assert!(!parse_bool(" false ").unwrap());
    assert!(!parse_bool("0").unwrap());
    assert!(parse_bool("yes").is_err());

    assert_eq!("2494", format_float(2494.0));
    assert_eq!("0.00334672", format_float(0.00334672));
}

#[test]
fn test_decode() {
    let doc = Document::parse(CYCLE).unwrap();
    let fields = decode(doc.root(), CYCLE_FIELDS).unwrap();

    assert_eq!(6.0, fields.float("code").unwrap());
    assert_eq!("Flow cytometry model (separated)", fields.text("label").unwrap());
    assert_eq!(
        Some(vec![300.0, 480.0, 240.0, 60.0]),
        fields.float_list("phase_durations").unwrap()
    );
    assert_eq!(None, fields.float_list("phase_transition_rates").unwrap());
    assert!(fields.boolean("enabled").unwrap());
    assert_eq!(0.5, fields.float("bias").unwrap());
}

#[test]
fn test_decode_errors() {
    let doc = Document::parse("<cycle code='x'><enabled>1</enabled><bias>1</bias></cycle>")
        .unwrap();
    let err = decode(doc.root(), CYCLE_FIELDS).unwrap_err();
    assert_eq!(crate::ErrorCode::ExpectedNumber, err.code);
    assert!(err.details.unwrap().starts_with("code"));

    let doc = Document::parse("<cycle code='1' name='n'><enabled>1</enabled></cycle>").unwrap();
    let err = decode(doc.root(), CYCLE_FIELDS).unwrap_err();
    assert_eq!(crate::ErrorKind::MalformedField, err.kind);
    assert_eq!(crate::ErrorCode::MissingField, err.code);
}

#[test]
fn test_encode_unchanged_is_a_no_op() {
    let mut doc = Document::parse(CYCLE).unwrap();
    let fields = decode(doc.root(), CYCLE_FIELDS).unwrap();
    encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap();
    assert_eq!(CYCLE, doc.to_xml_string().unwrap());
}

#[test]
fn test_encode_partial() {
    let mut doc = Document::parse(CYCLE).unwrap();
    let fields = Fields::new()
        .with("bias", Value::Float(0.25))
        .with("enabled", Value::Bool(false));
    encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap();

    let expected = CYCLE
        .replace("<bias>.5</bias>", "<bias>0.25</bias>")
        .replace("<enabled>1</enabled>", "<enabled>false</enabled>");
    assert_eq!(expected, doc.to_xml_string().unwrap());
}

#[test]
fn test_encode_list_in_place_and_resized() {
    let mut doc = Document::parse(CYCLE).unwrap();
    let fields = Fields::new().with("phase_durations", Value::FloatList(vec![300.0, 400.0]));
    encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap();
    let out = doc.to_xml_string().unwrap();
    assert!(out.contains("<duration index=\"0\" fixed_duration=\"false\">300.0</duration>"));
    assert!(out.contains("<duration index=\"1\" fixed_duration=\"true\">400</duration>"));
    assert!(!out.contains("240"));
    assert!(out.contains("<!-- durations -->"));
    assert!(out.contains("<enabled>1</enabled>"));

    let fields = Fields::new().with("phase_durations", Value::FloatList(vec![1.0, 2.0, 3.0]));
    encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap();
    let decoded = decode(doc.root(), CYCLE_FIELDS).unwrap();
    assert_eq!(
        Some(vec![1.0, 2.0, 3.0]),
        decoded.float_list("phase_durations").unwrap()
    );
    let out = doc.to_xml_string().unwrap();
    assert!(out.contains("\n        <duration index=\"2\" fixed_duration=\"true\">3</duration>"));
}

#[test]
fn test_encode_errors() {
    let mut doc = Document::parse(CYCLE).unwrap();

    let fields = Fields::new().with("nonsense", Value::Float(1.0));
    let err = encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap_err();
    assert_eq!(crate::ErrorCode::UnknownField, err.code);

    let fields = Fields::new().with("bias", Value::Bool(true));
    let err = encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap_err();
    assert_eq!(crate::ErrorCode::FieldKindMismatch, err.code);

    let fields = Fields::new().with("phase_transition_rates", Value::FloatList(vec![1.0]));
    let err = encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap_err();
    assert_eq!(crate::ErrorCode::MissingField, err.code);
}

#[test]
fn test_encode_duplicated_target_is_ambiguous() {
    let source = CYCLE.replace("<bias>.5</bias>", "<bias>.5</bias>\n    <bias>.25</bias>");
    let mut doc = Document::parse(&source).unwrap();

    let err = decode(doc.root(), CYCLE_FIELDS).unwrap_err();
    assert_eq!(crate::ErrorKind::Ambiguous, err.kind);

    let fields = Fields::new().with("bias", Value::Float(0.75));
    let err = encode(doc.root_mut(), CYCLE_FIELDS, &fields).unwrap_err();
    assert_eq!(crate::ErrorKind::Ambiguous, err.kind);
    assert_eq!(crate::ErrorCode::AmbiguousMatch, err.code);
    assert!(err.details.unwrap().starts_with("bias"));
    assert_eq!(source, doc.to_xml_string().unwrap());
}
