// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Io,
    XmlDeserialization,
    XmlSerialization,
    UnrecognizedRoot,
    DoesNotExist, // the named entity doesn't exist
    AmbiguousMatch,
    MissingField,
    ExpectedNumber,
    ExpectedBool,
    UnknownField,
    FieldKindMismatch,
    InvalidValue,
    VariantConflict,
    BadPath,
    UnboundPlaceholder,
    NoSourcePath, // save() on a document that was not opened from disk
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            Io => "io",
            XmlDeserialization => "xml_deserialization",
            XmlSerialization => "xml_serialization",
            UnrecognizedRoot => "unrecognized_root",
            DoesNotExist => "does_not_exist",
            AmbiguousMatch => "ambiguous_match",
            MissingField => "missing_field",
            ExpectedNumber => "expected_number",
            ExpectedBool => "expected_bool",
            UnknownField => "unknown_field",
            FieldKindMismatch => "field_kind_mismatch",
            InvalidValue => "invalid_value",
            VariantConflict => "variant_conflict",
            BadPath => "bad_path",
            UnboundPlaceholder => "unbound_placeholder",
            NoSourcePath => "no_source_path",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    NotFound,
    Ambiguous,
    MalformedField,
    VariantConflict,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Load => "LoadError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Ambiguous => "AmbiguousError",
            ErrorKind::MalformedField => "MalformedFieldError",
            ErrorKind::VariantConflict => "VariantConflictError",
            ErrorKind::Path => "PathError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Load, ErrorCode::Io, Some(err.to_string()))
    }
}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! load_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Load, ErrorCode::$code, Some($str)))
    }}
);

#[macro_export]
macro_rules! not_found_err(
    ($str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::NotFound, ErrorCode::DoesNotExist, Some($str)))
    }}
);

#[macro_export]
macro_rules! field_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::MalformedField,
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::MalformedField, ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::NotFound,
        ErrorCode::DoesNotExist,
        Some("cell_definition[@name='tumor']".to_owned()),
    );
    assert_eq!(
        "NotFoundError{does_not_exist: cell_definition[@name='tumor']}",
        format!("{err}")
    );

    let err = Error::new(ErrorKind::MalformedField, ErrorCode::ExpectedNumber, None);
    assert_eq!("MalformedFieldError{expected_number}", format!("{err}"));
}

#[test]
fn test_error_macros() {
    let result: Result<()> = field_err!(MissingField, "volume.total".to_owned());
    let err = result.unwrap_err();
    assert_eq!(ErrorKind::MalformedField, err.kind);
    assert_eq!(ErrorCode::MissingField, err.code);
    assert_eq!(Some("volume.total".to_owned()), err.get_details());

    let result: Result<()> = not_found_err!("substance 'oxygen'".to_owned());
    assert_eq!(ErrorKind::NotFound, result.unwrap_err().kind);
}
