// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::not_found_err;
use crate::xml::Element;

macro_rules! path_err(
    ($code:tt, $str:expr) => {{
        Err(Error::new(ErrorKind::Path, ErrorCode::$code, Some($str)))
    }}
);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    pub attribute: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub predicate: Option<Predicate>,
}

impl Step {
    fn matches(&self, el: &Element) -> bool {
        if el.name() != self.name {
            return false;
        }
        match self.predicate {
            None => true,
            Some(ref pred) => el.attribute(&pred.attribute) == Some(pred.value.as_str()),
        }
    }
}

/// A resolved element path such as
/// `cell_definitions/cell_definition[@name='default']/phenotype/cycle`.
///
/// Paths are relative to the element they are resolved against; the empty
/// path resolves to that element itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementPath {
    steps: Vec<Step>,
}

impl ElementPath {
    pub fn parse(expr: &str) -> Result<Self> {
        let mut steps = vec![];
        for segment in split_segments(expr)? {
            steps.push(parse_step(segment, expr)?);
        }
        Ok(ElementPath { steps })
    }

    /// Parses `template` and then substitutes predicate values written as
    /// `{key}` from `bindings`. Substitution happens after parsing, so bound
    /// values are never interpreted as path syntax.
    pub fn from_template(template: &str, bindings: &[(&str, &str)]) -> Result<Self> {
        let mut path = ElementPath::parse(template)?;
        for step in path.steps.iter_mut() {
            let Some(ref mut pred) = step.predicate else {
                continue;
            };
            let Some(key) = pred
                .value
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            else {
                continue;
            };
            match bindings.iter().find(|(name, _)| *name == key) {
                Some((_, value)) => pred.value = (*value).to_owned(),
                None => {
                    return path_err!(
                        UnboundPlaceholder,
                        format!("{{{key}}} in '{template}'")
                    );
                }
            }
        }
        Ok(path)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn join(&self, other: &ElementPath) -> ElementPath {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        ElementPath { steps }
    }

    pub fn child(mut self, name: &str) -> ElementPath {
        self.steps.push(Step {
            name: name.to_owned(),
            predicate: None,
        });
        self
    }

    pub fn child_where(mut self, name: &str, attribute: &str, value: &str) -> ElementPath {
        self.steps.push(Step {
            name: name.to_owned(),
            predicate: Some(Predicate {
                attribute: attribute.to_owned(),
                value: value.to_owned(),
            }),
        });
        self
    }

    /// Every match as a trail of child indices from `root`, in document order.
    pub fn locate(&self, root: &Element) -> Vec<Vec<usize>> {
        fn walk(el: &Element, steps: &[Step], trail: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            let Some((step, rest)) = steps.split_first() else {
                out.push(trail.clone());
                return;
            };
            for (i, child) in el.elements() {
                if step.matches(child) {
                    trail.push(i);
                    walk(child, rest, trail, out);
                    trail.pop();
                }
            }
        }

        let mut out = vec![];
        walk(root, &self.steps, &mut vec![], &mut out);
        out
    }

    fn locate_unique(&self, root: &Element) -> Result<Vec<usize>> {
        let mut matches = self.locate(root);
        match matches.len() {
            0 => not_found_err!(format!("no element matches '{self}'")),
            1 => Ok(matches.remove(0)),
            n => Err(Error::new(
                ErrorKind::Ambiguous,
                ErrorCode::AmbiguousMatch,
                Some(format!("{n} elements match '{self}'")),
            )),
        }
    }

    pub fn resolve<'a>(&self, root: &'a Element) -> Result<&'a Element> {
        let trail = self.locate_unique(root)?;
        let mut el = root;
        for i in trail {
            // trail indices come from locate() over this same tree
            el = match el.element_at(i) {
                Some(child) => child,
                None => return not_found_err!(format!("'{self}'")),
            };
        }
        Ok(el)
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut Element) -> Result<&'a mut Element> {
        let trail = self.locate_unique(root)?;
        let mut el = root;
        for i in trail {
            el = match el.element_at_mut(i) {
                Some(child) => child,
                None => return not_found_err!(format!("'{self}'")),
            };
        }
        Ok(el)
    }

    pub fn resolve_all<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        self.locate(root)
            .into_iter()
            .filter_map(|trail| {
                let mut el = root;
                for i in trail {
                    el = el.element_at(i)?;
                }
                Some(el)
            })
            .collect()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", step.name)?;
            if let Some(ref pred) = step.predicate {
                let quote = if pred.value.contains('\'') { '"' } else { '\'' };
                write!(f, "[@{}={quote}{}{quote}]", pred.attribute, pred.value)?;
            }
        }
        Ok(())
    }
}

fn split_segments(expr: &str) -> Result<Vec<&str>> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(vec![]);
    }

    let mut segments = vec![];
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => (),
            (None, '\'' | '"') => quote = Some(c),
            (None, '/') => {
                segments.push(&expr[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    if quote.is_some() {
        return path_err!(BadPath, format!("unterminated quote in '{expr}'"));
    }
    segments.push(&expr[start..]);
    Ok(segments)
}

fn parse_step(segment: &str, expr: &str) -> Result<Step> {
    let segment = segment.trim();
    let (name, predicate) = match segment.find('[') {
        None => (segment, None),
        Some(open) => {
            let Some(body) = segment[open + 1..].strip_suffix(']') else {
                return path_err!(BadPath, format!("unterminated predicate in '{expr}'"));
            };
            (&segment[..open], Some(parse_predicate(body, expr)?))
        }
    };

    let valid_name = !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '@' | '\'' | '"' | '='));
    if !valid_name {
        return path_err!(BadPath, format!("bad element name '{name}' in '{expr}'"));
    }

    Ok(Step {
        name: name.to_owned(),
        predicate,
    })
}

fn parse_predicate(body: &str, expr: &str) -> Result<Predicate> {
    let malformed = || -> Result<Predicate> {
        path_err!(BadPath, format!("expected [@attr='value'] in '{expr}'"))
    };

    let Some(body) = body.trim().strip_prefix('@') else {
        return malformed();
    };
    let Some((attribute, value)) = body.split_once('=') else {
        return malformed();
    };
    let attribute = attribute.trim();
    let value = value.trim();

    let quoted = value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')));
    if attribute.is_empty() || !quoted {
        return malformed();
    }

    Ok(Predicate {
        attribute: attribute.to_owned(),
        value: value[1..value.len() - 1].to_owned(),
    })
}

#[cfg(test)]
fn sample_root() -> crate::xml::Document {
    crate::xml::Document::parse(
        r#"<root>
    <cell_definitions>
        <cell_definition name="default"><phenotype><cycle code="6"/></phenotype></cell_definition>
        <cell_definition name="cancer"><phenotype><cycle code="5"/></phenotype></cell_definition>
        <cell_definition name="twin"/>
        <cell_definition name="twin"/>
    </cell_definitions>
</root>"#,
    )
    .unwrap()
}

#[test]
fn test_parse_and_display() {
    let path = ElementPath::parse("cell_definitions/cell_definition[@name='default']/phenotype")
        .unwrap();
    assert_eq!(3, path.steps().len());
    assert_eq!(
        Some(Predicate {
            attribute: "name".to_owned(),
            value: "default".to_owned(),
        }),
        path.steps()[1].predicate
    );
    assert_eq!(
        "cell_definitions/cell_definition[@name='default']/phenotype",
        path.to_string()
    );

    let path = ElementPath::parse("a[@name=\"x/y\"]/b").unwrap();
    assert_eq!(2, path.steps().len());
    assert_eq!("x/y", path.steps()[0].predicate.as_ref().unwrap().value);

    assert!(ElementPath::parse("").unwrap().is_empty());
}

#[test]
fn test_parse_errors() {
    for bad in &["a//b", "a[@name='x'", "a[name='x']", "a[@name=x]", "a/[@n='x']", "a[@name='x]"] {
        let err = ElementPath::parse(bad).unwrap_err();
        assert_eq!(ErrorKind::Path, err.kind, "{bad}");
        assert_eq!(ErrorCode::BadPath, err.code, "{bad}");
    }
}

#[test]
fn test_template_substitution() {
    let path = ElementPath::from_template(
        "cell_definitions/cell_definition[@name='{cell_type}']/phenotype",
        &[("cell_type", "it's/odd]")],
    )
    .unwrap();
    assert_eq!("it's/odd]", path.steps()[1].predicate.as_ref().unwrap().value);

    let err = ElementPath::from_template("a[@name='{missing}']", &[]).unwrap_err();
    assert_eq!(ErrorCode::UnboundPlaceholder, err.code);
}

#[test]
fn test_resolve_unique() {
    let doc = sample_root();
    let path = ElementPath::from_template(
        "cell_definitions/cell_definition[@name='{cell_type}']/phenotype/cycle",
        &[("cell_type", "cancer")],
    )
    .unwrap();
    assert_eq!(Some("5"), path.resolve(doc.root()).unwrap().attribute("code"));

    let err = ElementPath::parse("cell_definitions/cell_definition[@name='tumor']")
        .unwrap()
        .resolve(doc.root())
        .unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);

    let err = ElementPath::parse("cell_definitions/cell_definition[@name='twin']")
        .unwrap()
        .resolve(doc.root())
        .unwrap_err();
    assert_eq!(ErrorKind::Ambiguous, err.kind);

    let err = ElementPath::parse("cell_definitions/cell_definition")
        .unwrap()
        .resolve(doc.root())
        .unwrap_err();
    assert_eq!(ErrorKind::Ambiguous, err.kind);
}

#[test]
fn test_resolve_all_and_mut() {
    let mut doc = sample_root();
    let all = ElementPath::parse("cell_definitions/cell_definition").unwrap();
    let names: Vec<&str> = all
        .resolve_all(doc.root())
        .into_iter()
        .filter_map(|el| el.attribute("name"))
        .collect();
    assert_eq!(vec!["default", "cancer", "twin", "twin"], names);

    assert!(
        ElementPath::parse("nothing/here")
            .unwrap()
            .resolve_all(doc.root())
            .is_empty()
    );

    let cycle = ElementPath::parse("cell_definitions")
        .unwrap()
        .child_where("cell_definition", "name", "default")
        .child("phenotype")
        .child("cycle");
    cycle.resolve_mut(doc.root_mut()).unwrap().set_attribute("code", "2");
    assert_eq!(Some("2"), cycle.resolve(doc.root()).unwrap().attribute("code"));

    let root = ElementPath::default().resolve(doc.root()).unwrap();
    assert_eq!("root", root.name());
}
