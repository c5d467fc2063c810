// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use log::debug;

use crate::codec::{self, FieldKind, FieldSpec, Fields, Value};
use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{
    Cycle, CustomData, Death, Domain, Mechanics, Motility, Overall, PhaseTiming, Secretion,
    Substance, Volume, phase_count,
};
use crate::path::ElementPath;
use crate::xml::Element;
use crate::{field_err, not_found_err};

/// A parameter group: a typed record plus the table describing where each
/// of its fields lives relative to the group's element.
pub trait ParameterGroup: Sized {
    const NAME: &'static str;
    const FIELDS: &'static [FieldSpec];

    fn from_fields(fields: &Fields) -> Result<Self>;
    fn to_fields(&self) -> Fields;

    /// Checks record invariants that need no document context.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Checks the record against the element it is about to be written to.
    fn check_node(&self, _node: &Element) -> Result<()> {
        Ok(())
    }
}

/// A group that appears as repeated sibling entries under one parent.
pub trait ListGroup: ParameterGroup {
    fn is_entry(el: &Element) -> bool;

    /// Whether `el` is the entry this record's natural key refers to.
    fn matches(&self, el: &Element) -> bool;

    fn key(&self) -> String;
}

pub fn decode_group<G: ParameterGroup>(node: &Element) -> Result<G> {
    let fields = codec::decode(node, G::FIELDS)?;
    G::from_fields(&fields)
}

/// Applies `record` to its element. Callers validate the record first.
pub fn encode_group<G: ParameterGroup>(node: &mut Element, record: &G) -> Result<()> {
    record.check_node(node)?;
    codec::encode(node, G::FIELDS, &record.to_fields())
}

pub fn read_group<G: ParameterGroup>(root: &Element, path: &ElementPath) -> Result<G> {
    debug!("reading {} at '{}'", G::NAME, path);
    decode_group(path.resolve(root)?)
}

pub fn write_group<G: ParameterGroup>(
    root: &mut Element,
    path: &ElementPath,
    record: &G,
) -> Result<()> {
    debug!("writing {} at '{}'", G::NAME, path);
    record.validate()?;
    encode_group(path.resolve_mut(root)?, record)
}

/// Reads every entry under the unique element at `parent`, in document order.
pub fn read_list<G: ListGroup>(root: &Element, parent: &ElementPath) -> Result<Vec<G>> {
    debug!("reading {} list at '{}'", G::NAME, parent);
    let parent_el = parent.resolve(root)?;
    let mut records = vec![];
    for (_, el) in parent_el.elements() {
        if G::is_entry(el) {
            records.push(decode_group(el)?);
        } else {
            debug!("skipping <{}> under '{}'", el.name(), parent);
        }
    }
    Ok(records)
}

/// Applies each record to the entry its key selects. Entries are never
/// added or removed. Every record is validated and matched before any entry
/// is touched, so a failing record leaves the list as it was.
pub fn write_list_by_key<G: ListGroup>(
    root: &mut Element,
    parent: &ElementPath,
    records: &[G],
) -> Result<()> {
    debug!("writing {} {} entries at '{}'", records.len(), G::NAME, parent);
    for record in records.iter() {
        record.validate()?;
    }
    let parent_el = parent.resolve_mut(root)?;

    let mut targets = Vec::with_capacity(records.len());
    for record in records.iter() {
        let index = entry_index(parent_el, parent, record)?;
        match parent_el.element_at(index) {
            Some(el) => record.check_node(el)?,
            None => return not_found_err!(format!("{} '{}'", G::NAME, record.key())),
        }
        targets.push(index);
    }

    for (record, index) in records.iter().zip(targets) {
        match parent_el.element_at_mut(index) {
            Some(el) => codec::encode(el, G::FIELDS, &record.to_fields())?,
            None => return not_found_err!(format!("{} '{}'", G::NAME, record.key())),
        }
    }
    Ok(())
}

/// Position of the single entry under `parent_el` that `record` selects.
fn entry_index<G: ListGroup>(parent_el: &Element, parent: &ElementPath, record: &G) -> Result<usize> {
    let positions: Vec<usize> = parent_el
        .elements()
        .filter(|(_, el)| G::is_entry(el) && record.matches(el))
        .map(|(i, _)| i)
        .collect();
    match positions.as_slice() {
        [index] => Ok(*index),
        [] => not_found_err!(format!("{} '{}' under '{}'", G::NAME, record.key(), parent)),
        _ => Err(Error::new(
            ErrorKind::Ambiguous,
            ErrorCode::AmbiguousMatch,
            Some(format!(
                "{} entries for {} '{}' under '{}'",
                positions.len(),
                G::NAME,
                record.key(),
                parent
            )),
        )),
    }
}

fn require_name(group: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return field_err!(InvalidValue, format!("{group}: name must not be empty"));
    }
    Ok(())
}

fn timing_from_fields(group: &str, fields: &Fields) -> Result<PhaseTiming> {
    let durations = fields.float_list(DURATIONS)?;
    let rates = fields.float_list(TRANSITION_RATES)?;
    let conflict = |what: &str| -> Result<PhaseTiming> {
        Err(Error::new(
            ErrorKind::VariantConflict,
            ErrorCode::VariantConflict,
            Some(format!("{group}: {what} of {DURATIONS} and {TRANSITION_RATES} present")),
        ))
    };
    match (durations, rates) {
        (Some(durations), None) => Ok(PhaseTiming::Durations(durations)),
        (None, Some(rates)) => Ok(PhaseTiming::TransitionRates(rates)),
        (Some(_), Some(_)) => conflict("both"),
        (None, None) => conflict("neither"),
    }
}

fn timing_to_fields(fields: &mut Fields, timing: &PhaseTiming) {
    let name = match timing {
        PhaseTiming::Durations(_) => DURATIONS,
        PhaseTiming::TransitionRates(_) => TRANSITION_RATES,
    };
    fields.insert(name, Value::FloatList(timing.values().to_vec()));
}

fn check_phase_count(group: &str, code: f64, timing: &PhaseTiming) -> Result<()> {
    match phase_count(code) {
        Some(n) if n != timing.len() => field_err!(
            InvalidValue,
            format!(
                "{group}: model {code} has {n} phases but {} has {} values",
                timing.variant_name(),
                timing.len()
            )
        ),
        _ => Ok(()),
    }
}

/// Switching between durations and rates is not supported: the document
/// must already encode the variant being written.
fn check_timing_variant(group: &str, node: &Element, timing: &PhaseTiming) -> Result<()> {
    let encoded = node.elements().any(|(_, el)| el.name() == timing.variant_name());
    if !encoded {
        return Err(Error::new(
            ErrorKind::VariantConflict,
            ErrorCode::VariantConflict,
            Some(format!(
                "{group}: document does not encode {}",
                timing.variant_name()
            )),
        ));
    }
    Ok(())
}

const DURATIONS: &str = "phase_durations";
const TRANSITION_RATES: &str = "phase_transition_rates";

impl ParameterGroup for Domain {
    const NAME: &'static str = "domain";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::float("x_min", "x_min"),
        FieldSpec::float("x_max", "x_max"),
        FieldSpec::float("y_min", "y_min"),
        FieldSpec::float("y_max", "y_max"),
        FieldSpec::float("z_min", "z_min"),
        FieldSpec::float("z_max", "z_max"),
        FieldSpec::float("dx", "dx"),
        FieldSpec::float("dy", "dy"),
        FieldSpec::float("dz", "dz"),
        FieldSpec::boolean("use_2d", "use_2D"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Domain {
            x_min: fields.float("x_min")?,
            x_max: fields.float("x_max")?,
            y_min: fields.float("y_min")?,
            y_max: fields.float("y_max")?,
            z_min: fields.float("z_min")?,
            z_max: fields.float("z_max")?,
            dx: fields.float("dx")?,
            dy: fields.float("dy")?,
            dz: fields.float("dz")?,
            use_2d: fields.boolean("use_2d")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("x_min", Value::Float(self.x_min))
            .with("x_max", Value::Float(self.x_max))
            .with("y_min", Value::Float(self.y_min))
            .with("y_max", Value::Float(self.y_max))
            .with("z_min", Value::Float(self.z_min))
            .with("z_max", Value::Float(self.z_max))
            .with("dx", Value::Float(self.dx))
            .with("dy", Value::Float(self.dy))
            .with("dz", Value::Float(self.dz))
            .with("use_2d", Value::Bool(self.use_2d))
    }

    fn validate(&self) -> Result<()> {
        let axes = [
            ("x", self.x_min, self.x_max),
            ("y", self.y_min, self.y_max),
            ("z", self.z_min, self.z_max),
        ];
        for (axis, min, max) in axes {
            if !(min < max) {
                return field_err!(
                    InvalidValue,
                    format!("domain: {axis}_min ({min}) must be less than {axis}_max ({max})")
                );
            }
        }
        Ok(())
    }
}

impl ParameterGroup for Overall {
    const NAME: &'static str = "overall";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::float("max_time", "max_time"),
        FieldSpec::float("dt_diffusion", "dt_diffusion"),
        FieldSpec::float("dt_mechanics", "dt_mechanics"),
        FieldSpec::float("dt_phenotype", "dt_phenotype"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Overall {
            max_time: fields.float("max_time")?,
            dt_diffusion: fields.float("dt_diffusion")?,
            dt_mechanics: fields.float("dt_mechanics")?,
            dt_phenotype: fields.float("dt_phenotype")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("max_time", Value::Float(self.max_time))
            .with("dt_diffusion", Value::Float(self.dt_diffusion))
            .with("dt_mechanics", Value::Float(self.dt_mechanics))
            .with("dt_phenotype", Value::Float(self.dt_phenotype))
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in self.to_fields().iter() {
            if let Value::Float(v) = *value {
                if !(v > 0.0) {
                    return field_err!(InvalidValue, format!("overall: {name} must be > 0, got {v}"));
                }
            }
        }
        Ok(())
    }
}

impl ParameterGroup for Substance {
    const NAME: &'static str = "substance";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::attribute("name", FieldKind::Text, "name"),
        FieldSpec::float(
            "diffusion_coefficient",
            "physical_parameter_set/diffusion_coefficient",
        ),
        FieldSpec::float("decay_rate", "physical_parameter_set/decay_rate"),
        FieldSpec::float("initial_condition", "initial_condition"),
        FieldSpec::float(
            "dirichlet_boundary_condition",
            "Dirichlet_boundary_condition",
        ),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Substance {
            name: fields.text("name")?,
            diffusion_coefficient: fields.float("diffusion_coefficient")?,
            decay_rate: fields.float("decay_rate")?,
            initial_condition: fields.float("initial_condition")?,
            dirichlet_boundary_condition: fields.float("dirichlet_boundary_condition")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", Value::Text(self.name.clone()))
            .with(
                "diffusion_coefficient",
                Value::Float(self.diffusion_coefficient),
            )
            .with("decay_rate", Value::Float(self.decay_rate))
            .with("initial_condition", Value::Float(self.initial_condition))
            .with(
                "dirichlet_boundary_condition",
                Value::Float(self.dirichlet_boundary_condition),
            )
    }

    fn validate(&self) -> Result<()> {
        require_name(Self::NAME, &self.name)
    }
}

impl ListGroup for Substance {
    fn is_entry(el: &Element) -> bool {
        el.name() == "variable"
    }

    fn matches(&self, el: &Element) -> bool {
        el.attribute("name") == Some(self.name.as_str())
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

impl ParameterGroup for Cycle {
    const NAME: &'static str = "cycle";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::attribute("code", FieldKind::Float, "code"),
        FieldSpec::optional_list(DURATIONS, DURATIONS, "duration"),
        FieldSpec::optional_list(TRANSITION_RATES, TRANSITION_RATES, "rate"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Cycle {
            code: fields.float("code")?,
            timing: timing_from_fields(Self::NAME, fields)?,
        })
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new().with("code", Value::Float(self.code));
        timing_to_fields(&mut fields, &self.timing);
        fields
    }

    fn validate(&self) -> Result<()> {
        check_phase_count(Self::NAME, self.code, &self.timing)
    }

    fn check_node(&self, node: &Element) -> Result<()> {
        check_timing_variant(Self::NAME, node, &self.timing)
    }
}

impl ParameterGroup for Death {
    const NAME: &'static str = "death model";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::attribute("code", FieldKind::Float, "code"),
        FieldSpec::float("death_rate", "death_rate"),
        FieldSpec::optional_list(DURATIONS, DURATIONS, "duration"),
        FieldSpec::optional_list(TRANSITION_RATES, TRANSITION_RATES, "rate"),
        FieldSpec::float(
            "unlysed_fluid_change_rate",
            "parameters/unlysed_fluid_change_rate",
        ),
        FieldSpec::float(
            "lysed_fluid_change_rate",
            "parameters/lysed_fluid_change_rate",
        ),
        FieldSpec::float(
            "cytoplasmic_biomass_change_rate",
            "parameters/cytoplasmic_biomass_change_rate",
        ),
        FieldSpec::float(
            "nuclear_biomass_change_rate",
            "parameters/nuclear_biomass_change_rate",
        ),
        FieldSpec::float("calcification_rate", "parameters/calcification_rate"),
        FieldSpec::float(
            "relative_rupture_volume",
            "parameters/relative_rupture_volume",
        ),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Death {
            code: fields.float("code")?,
            death_rate: fields.float("death_rate")?,
            timing: timing_from_fields(Self::NAME, fields)?,
            unlysed_fluid_change_rate: fields.float("unlysed_fluid_change_rate")?,
            lysed_fluid_change_rate: fields.float("lysed_fluid_change_rate")?,
            cytoplasmic_biomass_change_rate: fields.float("cytoplasmic_biomass_change_rate")?,
            nuclear_biomass_change_rate: fields.float("nuclear_biomass_change_rate")?,
            calcification_rate: fields.float("calcification_rate")?,
            relative_rupture_volume: fields.float("relative_rupture_volume")?,
        })
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new()
            .with("code", Value::Float(self.code))
            .with("death_rate", Value::Float(self.death_rate))
            .with(
                "unlysed_fluid_change_rate",
                Value::Float(self.unlysed_fluid_change_rate),
            )
            .with(
                "lysed_fluid_change_rate",
                Value::Float(self.lysed_fluid_change_rate),
            )
            .with(
                "cytoplasmic_biomass_change_rate",
                Value::Float(self.cytoplasmic_biomass_change_rate),
            )
            .with(
                "nuclear_biomass_change_rate",
                Value::Float(self.nuclear_biomass_change_rate),
            )
            .with("calcification_rate", Value::Float(self.calcification_rate))
            .with(
                "relative_rupture_volume",
                Value::Float(self.relative_rupture_volume),
            );
        timing_to_fields(&mut fields, &self.timing);
        fields
    }

    fn validate(&self) -> Result<()> {
        check_phase_count(Self::NAME, self.code, &self.timing)
    }

    fn check_node(&self, node: &Element) -> Result<()> {
        check_timing_variant(Self::NAME, node, &self.timing)
    }
}

impl ListGroup for Death {
    fn is_entry(el: &Element) -> bool {
        el.name() == "model"
    }

    fn matches(&self, el: &Element) -> bool {
        el.attribute("code")
            .and_then(|code| codec::parse_float(code).ok())
            == Some(self.code)
    }

    fn key(&self) -> String {
        codec::format_float(self.code)
    }
}

impl ParameterGroup for Volume {
    const NAME: &'static str = "volume";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::float("total_volume", "total"),
        FieldSpec::float("fluid_fraction", "fluid_fraction"),
        FieldSpec::float("nuclear", "nuclear"),
        FieldSpec::float("fluid_change_rate", "fluid_change_rate"),
        FieldSpec::float(
            "cytoplasmic_bio_change_rate",
            "cytoplasmic_biomass_change_rate",
        ),
        FieldSpec::float("nuclear_bio_change_rate", "nuclear_biomass_change_rate"),
        FieldSpec::float("calcified_fraction", "calcified_fraction"),
        FieldSpec::float("calcification_rate", "calcification_rate"),
        FieldSpec::float("relative_rupture_volume", "relative_rupture_volume"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Volume {
            total_volume: fields.float("total_volume")?,
            fluid_fraction: fields.float("fluid_fraction")?,
            nuclear: fields.float("nuclear")?,
            fluid_change_rate: fields.float("fluid_change_rate")?,
            cytoplasmic_bio_change_rate: fields.float("cytoplasmic_bio_change_rate")?,
            nuclear_bio_change_rate: fields.float("nuclear_bio_change_rate")?,
            calcified_fraction: fields.float("calcified_fraction")?,
            calcification_rate: fields.float("calcification_rate")?,
            relative_rupture_volume: fields.float("relative_rupture_volume")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("total_volume", Value::Float(self.total_volume))
            .with("fluid_fraction", Value::Float(self.fluid_fraction))
            .with("nuclear", Value::Float(self.nuclear))
            .with("fluid_change_rate", Value::Float(self.fluid_change_rate))
            .with(
                "cytoplasmic_bio_change_rate",
                Value::Float(self.cytoplasmic_bio_change_rate),
            )
            .with(
                "nuclear_bio_change_rate",
                Value::Float(self.nuclear_bio_change_rate),
            )
            .with("calcified_fraction", Value::Float(self.calcified_fraction))
            .with("calcification_rate", Value::Float(self.calcification_rate))
            .with(
                "relative_rupture_volume",
                Value::Float(self.relative_rupture_volume),
            )
    }
}

impl ParameterGroup for Mechanics {
    const NAME: &'static str = "mechanics";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::float("cell_cell_adhesion_strength", "cell_cell_adhesion_strength"),
        FieldSpec::float(
            "cell_cell_repulsion_strength",
            "cell_cell_repulsion_strength",
        ),
        FieldSpec::float(
            "relative_maximum_adhesion_distance",
            "relative_maximum_adhesion_distance",
        ),
        FieldSpec::float(
            "relative_equilibrium_distance",
            "options/set_relative_equilibrium_distance",
        ),
        FieldSpec::float(
            "absolute_equilibrium_distance",
            "options/set_absolute_equilibrium_distance",
        ),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Mechanics {
            cell_cell_adhesion_strength: fields.float("cell_cell_adhesion_strength")?,
            cell_cell_repulsion_strength: fields.float("cell_cell_repulsion_strength")?,
            relative_maximum_adhesion_distance: fields
                .float("relative_maximum_adhesion_distance")?,
            relative_equilibrium_distance: fields.float("relative_equilibrium_distance")?,
            absolute_equilibrium_distance: fields.float("absolute_equilibrium_distance")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with(
                "cell_cell_adhesion_strength",
                Value::Float(self.cell_cell_adhesion_strength),
            )
            .with(
                "cell_cell_repulsion_strength",
                Value::Float(self.cell_cell_repulsion_strength),
            )
            .with(
                "relative_maximum_adhesion_distance",
                Value::Float(self.relative_maximum_adhesion_distance),
            )
            .with(
                "relative_equilibrium_distance",
                Value::Float(self.relative_equilibrium_distance),
            )
            .with(
                "absolute_equilibrium_distance",
                Value::Float(self.absolute_equilibrium_distance),
            )
    }
}

impl ParameterGroup for Motility {
    const NAME: &'static str = "motility";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::float("speed", "speed"),
        FieldSpec::float("persistence_time", "persistence_time"),
        FieldSpec::float("bias", "migration_bias"),
        FieldSpec::boolean("motility_enabled", "options/enabled"),
        FieldSpec::boolean("use_2d", "options/use_2D"),
        FieldSpec::boolean("chemotaxis_enabled", "options/chemotaxis/enabled"),
        FieldSpec::text("chemotaxis_substrate", "options/chemotaxis/substrate"),
        FieldSpec::float("chemotaxis_direction", "options/chemotaxis/direction"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Motility {
            speed: fields.float("speed")?,
            persistence_time: fields.float("persistence_time")?,
            bias: fields.float("bias")?,
            motility_enabled: fields.boolean("motility_enabled")?,
            use_2d: fields.boolean("use_2d")?,
            chemotaxis_enabled: fields.boolean("chemotaxis_enabled")?,
            chemotaxis_substrate: fields.text("chemotaxis_substrate")?,
            chemotaxis_direction: fields.float("chemotaxis_direction")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("speed", Value::Float(self.speed))
            .with("persistence_time", Value::Float(self.persistence_time))
            .with("bias", Value::Float(self.bias))
            .with("motility_enabled", Value::Bool(self.motility_enabled))
            .with("use_2d", Value::Bool(self.use_2d))
            .with("chemotaxis_enabled", Value::Bool(self.chemotaxis_enabled))
            .with(
                "chemotaxis_substrate",
                Value::Text(self.chemotaxis_substrate.clone()),
            )
            .with(
                "chemotaxis_direction",
                Value::Float(self.chemotaxis_direction),
            )
    }
}

impl ParameterGroup for Secretion {
    const NAME: &'static str = "secretion";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::attribute("name", FieldKind::Text, "name"),
        FieldSpec::float("secretion_rate", "secretion_rate"),
        FieldSpec::float("secretion_target", "secretion_target"),
        FieldSpec::float("uptake_rate", "uptake_rate"),
        FieldSpec::float("net_export_rate", "net_export_rate"),
    ];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Secretion {
            name: fields.text("name")?,
            secretion_rate: fields.float("secretion_rate")?,
            secretion_target: fields.float("secretion_target")?,
            uptake_rate: fields.float("uptake_rate")?,
            net_export_rate: fields.float("net_export_rate")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", Value::Text(self.name.clone()))
            .with("secretion_rate", Value::Float(self.secretion_rate))
            .with("secretion_target", Value::Float(self.secretion_target))
            .with("uptake_rate", Value::Float(self.uptake_rate))
            .with("net_export_rate", Value::Float(self.net_export_rate))
    }

    fn validate(&self) -> Result<()> {
        require_name(Self::NAME, &self.name)
    }
}

impl ListGroup for Secretion {
    fn is_entry(el: &Element) -> bool {
        el.name() == "substrate"
    }

    fn matches(&self, el: &Element) -> bool {
        el.attribute("name") == Some(self.name.as_str())
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

// numeric user parameter types; anything else (divider, bool, string) is
// not exposed as a CustomData entry
const NUMERIC_TYPES: &[&str] = &["int", "double", "float"];

impl ParameterGroup for CustomData {
    const NAME: &'static str = "custom data";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::tag_name("name"), FieldSpec::float("value", "")];

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(CustomData {
            name: fields.text("name")?,
            value: fields.float("value")?,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("name", Value::Text(self.name.clone()))
            .with("value", Value::Float(self.value))
    }

    fn validate(&self) -> Result<()> {
        require_name(Self::NAME, &self.name)
    }
}

impl ListGroup for CustomData {
    fn is_entry(el: &Element) -> bool {
        match el.attribute("type") {
            None => true,
            Some(ty) => NUMERIC_TYPES
                .iter()
                .any(|numeric| ty.trim().eq_ignore_ascii_case(numeric)),
        }
    }

    fn matches(&self, el: &Element) -> bool {
        el.name() == self.name
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
use crate::xml::Document;

#[test]
fn test_cycle_variants() {
    let doc = Document::parse(
        r#"<cycle code="6"><phase_transition_rates units="1/min">
            <rate start_index="0" end_index="1" fixed_duration="false">0.00334672</rate>
            <rate start_index="1" end_index="2" fixed_duration="true">0.00208333</rate>
            <rate start_index="2" end_index="3" fixed_duration="true">0.00416667</rate>
            <rate start_index="3" end_index="0" fixed_duration="true">0.0166667</rate>
        </phase_transition_rates></cycle>"#,
    )
    .unwrap();
    let cycle: Cycle = decode_group(doc.root()).unwrap();
    assert_eq!(None, cycle.phase_durations());
    assert_eq!(
        Some(&[0.00334672, 0.00208333, 0.00416667, 0.0166667][..]),
        cycle.phase_transition_rates()
    );

    let both = Document::parse(
        "<cycle code='5'><phase_durations><duration>1</duration></phase_durations>\
         <phase_transition_rates><rate>1</rate></phase_transition_rates></cycle>",
    )
    .unwrap();
    let err = decode_group::<Cycle>(both.root()).unwrap_err();
    assert_eq!(ErrorKind::VariantConflict, err.kind);

    let neither = Document::parse("<cycle code='5'/>").unwrap();
    let err = decode_group::<Cycle>(neither.root()).unwrap_err();
    assert_eq!(ErrorKind::VariantConflict, err.kind);
}

#[test]
fn test_cycle_write_rejects_variant_switch_and_bad_length() {
    let mut doc =
        Document::parse("<cycle code='5'><phase_durations><duration>60</duration></phase_durations></cycle>")
            .unwrap();

    let switched = Cycle {
        code: 5.0,
        timing: PhaseTiming::TransitionRates(vec![0.1]),
    };
    let err = encode_group(doc.root_mut(), &switched).unwrap_err();
    assert_eq!(ErrorKind::VariantConflict, err.kind);

    let too_long = Cycle {
        code: 5.0,
        timing: PhaseTiming::Durations(vec![60.0, 30.0]),
    };
    let err = too_long.validate().unwrap_err();
    assert_eq!(ErrorCode::InvalidValue, err.code);

    let ok = Cycle {
        code: 5.0,
        timing: PhaseTiming::Durations(vec![90.0]),
    };
    encode_group(doc.root_mut(), &ok).unwrap();
    assert_eq!(ok, decode_group::<Cycle>(doc.root()).unwrap());
}

#[test]
fn test_domain_validation() {
    let domain = Domain {
        x_min: 10.0,
        x_max: -10.0,
        y_min: -10.0,
        y_max: 10.0,
        z_min: -10.0,
        z_max: 10.0,
        dx: 20.0,
        dy: 20.0,
        dz: 20.0,
        use_2d: true,
    };
    let err = domain.validate().unwrap_err();
    assert_eq!(ErrorKind::MalformedField, err.kind);
    assert_eq!(ErrorCode::InvalidValue, err.code);
    assert!(err.details.unwrap().contains("x_min"));
}

#[test]
fn test_overall_validation() {
    let overall = Overall {
        max_time: 7200.0,
        dt_diffusion: 0.01,
        dt_mechanics: 0.0,
        dt_phenotype: 6.0,
    };
    let err = overall.validate().unwrap_err();
    assert!(err.details.unwrap().contains("dt_mechanics"));
}

#[test]
fn test_custom_data_entries() {
    let mut doc = Document::parse(
        r#"<user_parameters>
    <random_seed type="int" units="dimensionless">0</random_seed>
    <div_initialization type="divider" description="---Initialization settings---"/>
    <number_of_cells type="int" units="none">5</number_of_cells>
    <use_oxygen type="bool">true</use_oxygen>
    <tumor_radius>250.0</tumor_radius>
</user_parameters>"#,
    )
    .unwrap();
    let root = ElementPath::default();

    let params: Vec<CustomData> = read_list(doc.root(), &root).unwrap();
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(vec!["random_seed", "number_of_cells", "tumor_radius"], names);
    assert_eq!(250.0, params[2].value);

    let update = [CustomData {
        name: "number_of_cells".to_owned(),
        value: 12.0,
    }];
    write_list_by_key(doc.root_mut(), &root, &update).unwrap();
    let out = doc.to_xml_string().unwrap();
    assert!(out.contains("<number_of_cells type=\"int\" units=\"none\">12</number_of_cells>"));
    assert!(out.contains("<random_seed type=\"int\" units=\"dimensionless\">0</random_seed>"));

    let missing = [CustomData {
        name: "use_oxygen".to_owned(),
        value: 1.0,
    }];
    let err = write_list_by_key(doc.root_mut(), &root, &missing).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn test_list_write_is_all_or_nothing() {
    let source = r#"<user_parameters>
    <random_seed type="int">0</random_seed>
    <number_of_cells type="int">5</number_of_cells>
    <tumor_radius>250.0</tumor_radius>
    <tumor_radius>300.0</tumor_radius>
</user_parameters>"#;
    let mut doc = Document::parse(source).unwrap();
    let root = ElementPath::default();
    let entry = |name: &str, value: f64| CustomData {
        name: name.to_owned(),
        value,
    };

    // the first record matches, the second names no entry
    let records = [entry("number_of_cells", 12.0), entry("use_oxygen", 1.0)];
    let err = write_list_by_key(doc.root_mut(), &root, &records).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
    assert_eq!(source, doc.to_xml_string().unwrap());

    let records = [entry("random_seed", 3.0), entry("tumor_radius", 1.0)];
    let err = write_list_by_key(doc.root_mut(), &root, &records).unwrap_err();
    assert_eq!(ErrorKind::Ambiguous, err.kind);
    assert_eq!(ErrorCode::AmbiguousMatch, err.code);
    assert_eq!(source, doc.to_xml_string().unwrap());

    let records = [entry("random_seed", 3.0), entry("number_of_cells", 12.0)];
    write_list_by_key(doc.root_mut(), &root, &records).unwrap();
    let out = doc.to_xml_string().unwrap();
    assert!(out.contains(r#"<random_seed type="int">3</random_seed>"#));
    assert!(out.contains(r#"<number_of_cells type="int">12</number_of_cells>"#));
}

#[test]
fn test_duplicated_field_element_is_ambiguous() {
    let source = r#"<volume>
    <total>2494</total>
    <fluid_fraction>0.75</fluid_fraction>
    <nuclear>540</nuclear>
    <nuclear>541</nuclear>
    <fluid_change_rate>0.05</fluid_change_rate>
    <cytoplasmic_biomass_change_rate>0.0045</cytoplasmic_biomass_change_rate>
    <nuclear_biomass_change_rate>0.0055</nuclear_biomass_change_rate>
    <calcified_fraction>0</calcified_fraction>
    <calcification_rate>0</calcification_rate>
    <relative_rupture_volume>2.0</relative_rupture_volume>
</volume>"#;
    let mut doc = Document::parse(source).unwrap();
    let volume = Volume {
        total_volume: 2494.0,
        fluid_fraction: 0.75,
        nuclear: 600.0,
        fluid_change_rate: 0.05,
        cytoplasmic_bio_change_rate: 0.0045,
        nuclear_bio_change_rate: 0.0055,
        calcified_fraction: 0.0,
        calcification_rate: 0.0,
        relative_rupture_volume: 2.0,
    };
    let err = write_group(doc.root_mut(), &ElementPath::default(), &volume).unwrap_err();
    assert_eq!(ErrorKind::Ambiguous, err.kind);
    assert_eq!(ErrorCode::AmbiguousMatch, err.code);
    assert_eq!(source, doc.to_xml_string().unwrap());
}

#[test]
fn test_death_key_is_numeric() {
    let doc = Document::parse("<death><model code=\"100.0\"/><model code='101'/></death>").unwrap();
    let (_, apoptosis) = doc.root().elements().next().unwrap();
    let death = Death {
        code: 100.0,
        death_rate: 0.0,
        timing: PhaseTiming::Durations(vec![516.0]),
        unlysed_fluid_change_rate: 0.0,
        lysed_fluid_change_rate: 0.0,
        cytoplasmic_biomass_change_rate: 0.0,
        nuclear_biomass_change_rate: 0.0,
        calcification_rate: 0.0,
        relative_rupture_volume: 2.0,
    };
    assert!(death.matches(apoptosis));
    assert_eq!("100", death.key());
}
