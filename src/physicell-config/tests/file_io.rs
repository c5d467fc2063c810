// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs;

use physicell_config::{ConfigFile, ErrorCode, ErrorKind};

const SETTINGS: &str = include_str!("../../../test/PhysiCell_settings.xml");

#[test]
fn save_persists_batched_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("PhysiCell_settings.xml");
    fs::write(&path, SETTINGS).unwrap();

    let mut config = ConfigFile::open(&path).unwrap();
    assert_eq!(Some(path.as_path()), config.path());

    let mut volume = config.read_volume_params("default").unwrap();
    volume.nuclear = 100.0;
    config.write_volume_params("default", &volume).unwrap();
    let mut domain = config.read_domain_params().unwrap();
    domain.x_min = -200.0;
    config.write_domain_params(&domain).unwrap();

    // nothing reaches disk before save
    assert_eq!(SETTINGS, fs::read_to_string(&path).unwrap());
    config.save().unwrap();

    let reopened = ConfigFile::open(&path).unwrap();
    assert_eq!(volume, reopened.read_volume_params("default").unwrap());
    assert_eq!(domain, reopened.read_domain_params().unwrap());
    assert_eq!(config.to_xml().unwrap(), fs::read_to_string(&path).unwrap());
}

#[test]
fn save_as_retargets_later_saves() {
    let dir = tempfile::tempdir().unwrap();
    let copy = dir.path().join("copy.xml");

    let mut config = ConfigFile::from_xml(SETTINGS).unwrap();
    assert_eq!(None, config.path());
    config.save_as(&copy).unwrap();
    assert_eq!(Some(copy.as_path()), config.path());
    assert_eq!(SETTINGS, fs::read_to_string(&copy).unwrap());

    let mut overall = config.read_overall_params().unwrap();
    overall.max_time = 1440.0;
    config.write_overall_params(&overall).unwrap();
    config.save().unwrap();
    assert_eq!(
        1440.0,
        ConfigFile::open(&copy)
            .unwrap()
            .read_overall_params()
            .unwrap()
            .max_time
    );
}

#[test]
fn open_reports_load_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = ConfigFile::open(dir.path().join("missing.xml")).err().unwrap();
    assert_eq!(ErrorKind::Load, err.kind);
    assert_eq!(ErrorCode::Io, err.code);

    let truncated = dir.path().join("truncated.xml");
    fs::write(&truncated, &SETTINGS[..SETTINGS.len() / 2]).unwrap();
    let err = ConfigFile::open(&truncated).err().unwrap();
    assert_eq!(ErrorKind::Load, err.kind);
    assert_eq!(ErrorCode::XmlDeserialization, err.code);
}
