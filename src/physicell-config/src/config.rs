// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! `ConfigFile` owns one loaded settings document and maps each parameter
//! group to and from its typed record. Writes only touch the in-memory
//! document; call `save` (or `to_xml`) to persist a batch of writes.

#[cfg(feature = "file_io")]
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::common::Result;
use crate::datamodel::{
    CustomData, Cycle, Death, Domain, Mechanics, Motility, Overall, Secretion, Substance, Volume,
};
use crate::groups::{read_group, read_list, write_group, write_list_by_key};
use crate::path::ElementPath;
use crate::xml::Document;
use crate::{load_err, not_found_err};

pub const ROOT_ELEMENT: &str = "PhysiCell_settings";

const DOMAIN: &str = "domain";
const OVERALL: &str = "overall";
const MICROENVIRONMENT: &str = "microenvironment_setup";
const SUBSTANCE: &str = "microenvironment_setup/variable[@name='{substance}']";
const SUBSTANCES: &str = "microenvironment_setup/variable";
const CELL_DEFINITIONS: &str = "cell_definitions/cell_definition";
const CELL_DEFINITION: &str = "cell_definitions/cell_definition[@name='{cell_type}']";
const CYCLE: &str = "phenotype/cycle";
const DEATH: &str = "phenotype/death";
const VOLUME: &str = "phenotype/volume";
const MECHANICS: &str = "phenotype/mechanics";
const MOTILITY: &str = "phenotype/motility";
const SECRETION: &str = "phenotype/secretion";
const SECRETION_SUBSTRATE: &str = "phenotype/secretion/substrate[@name='{substance}']";
const CUSTOM_DATA: &str = "custom_data";
const USER_PARAMETERS: &str = "user_parameters";

pub struct ConfigFile {
    doc: Document,
    path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_xml(source: &str) -> Result<Self> {
        let doc = Document::parse(source)?;
        if doc.root().name() != ROOT_ELEMENT {
            return load_err!(
                UnrecognizedRoot,
                format!("expected <{ROOT_ELEMENT}>, found <{}>", doc.root().name())
            );
        }
        info!("loaded settings document ({} bytes)", source.len());
        Ok(ConfigFile { doc, path: None })
    }

    #[cfg(feature = "file_io")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| {
            let mut err = crate::common::Error::from(err);
            err.details = err.details.map(|d| format!("{}: {d}", path.display()));
            err
        })?;
        let mut config = ConfigFile::from_xml(&source)?;
        info!("opened {}", path.display());
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Writes the document back to the file it was opened from.
    #[cfg(feature = "file_io")]
    pub fn save(&self) -> Result<()> {
        match self.path {
            Some(ref path) => self.write_to(path),
            None => load_err!(
                NoSourcePath,
                "document was not opened from a file; use save_as".to_owned()
            ),
        }
    }

    /// Writes the document to `path`, which becomes the target of later saves.
    #[cfg(feature = "file_io")]
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    #[cfg(feature = "file_io")]
    fn write_to(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml()?;
        fs::write(path, &xml)?;
        info!("saved {} ({} bytes)", path.display(), xml.len());
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        self.doc.to_xml_string()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Names of the declared cell types, in document order.
    pub fn cell_definitions_list(&self) -> Result<Vec<String>> {
        self.names_at(CELL_DEFINITIONS)
    }

    /// Names of the declared substances, in document order.
    pub fn substances_list(&self) -> Result<Vec<String>> {
        self.names_at(SUBSTANCES)
    }

    fn names_at(&self, expr: &str) -> Result<Vec<String>> {
        let path = ElementPath::parse(expr)?;
        Ok(path
            .resolve_all(self.doc.root())
            .into_iter()
            .filter_map(|el| el.attribute("name"))
            .map(|name| name.to_owned())
            .collect())
    }

    /// Path to `rel` under the named cell type, which must exist exactly once.
    fn cell_path(&self, cell_type: &str, rel: &str) -> Result<ElementPath> {
        let cell = ElementPath::from_template(CELL_DEFINITION, &[("cell_type", cell_type)])?;
        if let Err(mut err) = cell.resolve(self.doc.root()) {
            err.details = Some(format!("cell type '{cell_type}'"));
            return Err(err);
        }
        Ok(cell.join(&ElementPath::parse(rel)?))
    }

    fn secretion_path(&self, cell_type: &str, substance: &str) -> Result<ElementPath> {
        let cell = ElementPath::from_template(CELL_DEFINITION, &[("cell_type", cell_type)])?;
        let rel = ElementPath::from_template(SECRETION_SUBSTRATE, &[("substance", substance)])?;
        self.cell_path(cell_type, "")?;
        Ok(cell.join(&rel))
    }

    fn require_substance(&self, name: &str) -> Result<()> {
        if self.substances_list()?.iter().any(|s| s == name) {
            Ok(())
        } else {
            not_found_err!(format!("substance '{name}' is not declared"))
        }
    }

    pub fn read_domain_params(&self) -> Result<Domain> {
        read_group(self.doc.root(), &ElementPath::parse(DOMAIN)?)
    }

    pub fn write_domain_params(&mut self, domain: &Domain) -> Result<()> {
        write_group(self.doc.root_mut(), &ElementPath::parse(DOMAIN)?, domain)
    }

    pub fn read_overall_params(&self) -> Result<Overall> {
        read_group(self.doc.root(), &ElementPath::parse(OVERALL)?)
    }

    pub fn write_overall_params(&mut self, overall: &Overall) -> Result<()> {
        write_group(self.doc.root_mut(), &ElementPath::parse(OVERALL)?, overall)
    }

    pub fn read_substance_params(&self) -> Result<Vec<Substance>> {
        read_list(self.doc.root(), &ElementPath::parse(MICROENVIRONMENT)?)
    }

    pub fn write_substance_params(&mut self, substances: &[Substance]) -> Result<()> {
        write_list_by_key(
            self.doc.root_mut(),
            &ElementPath::parse(MICROENVIRONMENT)?,
            substances,
        )
    }

    pub fn read_substance(&self, name: &str) -> Result<Substance> {
        let path = ElementPath::from_template(SUBSTANCE, &[("substance", name)])?;
        read_group(self.doc.root(), &path)
    }

    pub fn write_substance(&mut self, substance: &Substance) -> Result<()> {
        let path = ElementPath::from_template(SUBSTANCE, &[("substance", &substance.name)])?;
        write_group(self.doc.root_mut(), &path, substance)
    }

    pub fn read_cycle_params(&self, cell_type: &str) -> Result<Cycle> {
        read_group(self.doc.root(), &self.cell_path(cell_type, CYCLE)?)
    }

    pub fn write_cycle_params(&mut self, cell_type: &str, cycle: &Cycle) -> Result<()> {
        let path = self.cell_path(cell_type, CYCLE)?;
        write_group(self.doc.root_mut(), &path, cycle)
    }

    /// Every death model of the cell type, in document order.
    pub fn read_death_params(&self, cell_type: &str) -> Result<Vec<Death>> {
        read_list(self.doc.root(), &self.cell_path(cell_type, DEATH)?)
    }

    /// Updates death models matched by `code`.
    pub fn write_death_params(&mut self, cell_type: &str, models: &[Death]) -> Result<()> {
        let path = self.cell_path(cell_type, DEATH)?;
        write_list_by_key(self.doc.root_mut(), &path, models)
    }

    pub fn read_volume_params(&self, cell_type: &str) -> Result<Volume> {
        read_group(self.doc.root(), &self.cell_path(cell_type, VOLUME)?)
    }

    pub fn write_volume_params(&mut self, cell_type: &str, volume: &Volume) -> Result<()> {
        let path = self.cell_path(cell_type, VOLUME)?;
        write_group(self.doc.root_mut(), &path, volume)
    }

    pub fn read_mechanics_params(&self, cell_type: &str) -> Result<Mechanics> {
        read_group(self.doc.root(), &self.cell_path(cell_type, MECHANICS)?)
    }

    pub fn write_mechanics_params(&mut self, cell_type: &str, mechanics: &Mechanics) -> Result<()> {
        let path = self.cell_path(cell_type, MECHANICS)?;
        write_group(self.doc.root_mut(), &path, mechanics)
    }

    pub fn read_motility_params(&self, cell_type: &str) -> Result<Motility> {
        read_group(self.doc.root(), &self.cell_path(cell_type, MOTILITY)?)
    }

    pub fn write_motility_params(&mut self, cell_type: &str, motility: &Motility) -> Result<()> {
        let path = self.cell_path(cell_type, MOTILITY)?;
        self.require_substance(&motility.chemotaxis_substrate)?;
        write_group(self.doc.root_mut(), &path, motility)
    }

    pub fn read_secretion_params(&self, cell_type: &str, substance: &str) -> Result<Secretion> {
        read_group(self.doc.root(), &self.secretion_path(cell_type, substance)?)
    }

    pub fn write_secretion_params(&mut self, cell_type: &str, secretion: &Secretion) -> Result<()> {
        let path = self.secretion_path(cell_type, &secretion.name)?;
        self.require_substance(&secretion.name)?;
        write_group(self.doc.root_mut(), &path, secretion)
    }

    pub fn read_secretion_list(&self, cell_type: &str) -> Result<Vec<Secretion>> {
        read_list(self.doc.root(), &self.cell_path(cell_type, SECRETION)?)
    }

    pub fn write_secretion_list(&mut self, cell_type: &str, secretions: &[Secretion]) -> Result<()> {
        let path = self.cell_path(cell_type, SECRETION)?;
        for secretion in secretions.iter() {
            self.require_substance(&secretion.name)?;
        }
        write_list_by_key(self.doc.root_mut(), &path, secretions)
    }

    pub fn read_custom_data(&self, cell_type: &str) -> Result<Vec<CustomData>> {
        read_list(self.doc.root(), &self.cell_path(cell_type, CUSTOM_DATA)?)
    }

    pub fn write_custom_data(&mut self, cell_type: &str, entries: &[CustomData]) -> Result<()> {
        let path = self.cell_path(cell_type, CUSTOM_DATA)?;
        write_list_by_key(self.doc.root_mut(), &path, entries)
    }

    pub fn read_user_parameters(&self) -> Result<Vec<CustomData>> {
        read_list(self.doc.root(), &ElementPath::parse(USER_PARAMETERS)?)
    }

    pub fn write_user_parameters(&mut self, entries: &[CustomData]) -> Result<()> {
        write_list_by_key(
            self.doc.root_mut(),
            &ElementPath::parse(USER_PARAMETERS)?,
            entries,
        )
    }
}

#[cfg(test)]
const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PhysiCell_settings version="devel-version">
    <microenvironment_setup>
        <variable name="oxygen" units="mmHg" ID="0">
            <physical_parameter_set>
                <diffusion_coefficient units="micron^2/min">100000.0</diffusion_coefficient>
                <decay_rate units="1/min">0.1</decay_rate>
            </physical_parameter_set>
            <initial_condition units="mmHg">38.0</initial_condition>
            <Dirichlet_boundary_condition units="mmHg" enabled="true">38.0</Dirichlet_boundary_condition>
        </variable>
    </microenvironment_setup>
    <cell_definitions>
        <cell_definition name="a" ID="0"/>
        <cell_definition name="b" ID="1"/>
        <cell_definition name="b" ID="2"/>
    </cell_definitions>
</PhysiCell_settings>
"#;

#[test]
fn test_unrecognized_root() {
    let err = ConfigFile::from_xml("<settings/>").err().unwrap();
    assert_eq!(crate::ErrorKind::Load, err.kind);
    assert_eq!(crate::ErrorCode::UnrecognizedRoot, err.code);

    let err = ConfigFile::from_xml("<PhysiCell_settings>").err().unwrap();
    assert_eq!(crate::ErrorKind::Load, err.kind);
}

#[test]
fn test_lists_and_cell_lookup() {
    let config = ConfigFile::from_xml(MINIMAL).unwrap();
    assert_eq!(vec!["a", "b", "b"], config.cell_definitions_list().unwrap());
    assert_eq!(vec!["oxygen"], config.substances_list().unwrap());
    assert_eq!(None, config.path());

    let err = config.read_volume_params("zebra").unwrap_err();
    assert_eq!(crate::ErrorKind::NotFound, err.kind);
    assert!(err.details.unwrap().contains("zebra"));

    let err = config.read_volume_params("b").unwrap_err();
    assert_eq!(crate::ErrorKind::Ambiguous, err.kind);

    let oxygen = config.read_substance("oxygen").unwrap();
    assert_eq!(100000.0, oxygen.diffusion_coefficient);
    assert_eq!(38.0, oxygen.dirichlet_boundary_condition);
}

#[cfg(feature = "file_io")]
#[test]
fn test_save_without_path() {
    let config = ConfigFile::from_xml(MINIMAL).unwrap();
    let err = config.save().unwrap_err();
    assert_eq!(crate::ErrorCode::NoSourcePath, err.code);
}
