// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod codec;
pub mod config;
pub mod datamodel;
pub mod groups;
pub mod path;
pub mod xml;

// Re-export key types from common
pub use common::{Error, ErrorCode, ErrorKind, Result};

pub use config::ConfigFile;
pub use datamodel::{
    CustomData, Cycle, Death, Domain, Mechanics, Motility, Overall, PhaseTiming, Secretion,
    Substance, Volume, phase_count,
};
pub use path::ElementPath;
