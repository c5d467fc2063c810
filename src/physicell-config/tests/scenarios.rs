// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end reads and writes against the reference settings document.

use physicell_config::{
    ConfigFile, CustomData, ElementPath, ErrorCode, ErrorKind, PhaseTiming, Secretion,
};

const SETTINGS: &str = include_str!("../../../test/PhysiCell_settings.xml");

fn load() -> ConfigFile {
    let _ = env_logger::builder().is_test(true).try_init();
    ConfigFile::from_xml(SETTINGS).unwrap()
}

fn subtree(config: &ConfigFile, expr: &str) -> String {
    ElementPath::parse(expr)
        .unwrap()
        .resolve(config.document().root())
        .unwrap()
        .to_xml_string()
        .unwrap()
}

#[test]
fn unmodified_document_roundtrips_exactly() {
    let config = load();
    assert_eq!(SETTINGS, config.to_xml().unwrap());
}

#[test]
fn lists_cell_types_and_substances() {
    let config = load();
    assert_eq!(
        vec!["default", "cancer"],
        config.cell_definitions_list().unwrap()
    );
    assert_eq!(
        vec!["substrate", "oxygen"],
        config.substances_list().unwrap()
    );
}

#[test]
fn reads_domain() {
    let config = load();
    let domain = config.read_domain_params().unwrap();
    assert_eq!(-500.0, domain.x_min);
    assert_eq!(500.0, domain.x_max);
    assert_eq!(-10.0, domain.z_min);
    assert_eq!(20.0, domain.dx);
    assert!(domain.use_2d);
}

#[test]
fn writes_domain_fields() {
    let mut config = load();
    let mut domain = config.read_domain_params().unwrap();
    domain.x_min = -200.0;
    domain.use_2d = false;
    config.write_domain_params(&domain).unwrap();

    let reread = config.read_domain_params().unwrap();
    assert_eq!(-200.0, reread.x_min);
    assert_eq!(500.0, reread.x_max);
    assert!(!reread.use_2d);

    let xml = config.to_xml().unwrap();
    assert!(xml.contains("<x_min>-200</x_min>"));
    assert!(xml.contains("<use_2D>false</use_2D>"));
    assert!(xml.contains("<y_min>-500</y_min>"));
}

#[test]
fn rejects_inverted_domain_without_touching_document() {
    let mut config = load();
    let mut domain = config.read_domain_params().unwrap();
    domain.x_min = 600.0;
    let err = config.write_domain_params(&domain).unwrap_err();
    assert_eq!(ErrorKind::MalformedField, err.kind);
    assert_eq!(ErrorCode::InvalidValue, err.code);
    assert_eq!(SETTINGS, config.to_xml().unwrap());
}

#[test]
fn reads_and_validates_overall() {
    let mut config = load();
    let mut overall = config.read_overall_params().unwrap();
    assert_eq!(7200.0, overall.max_time);
    assert_eq!(0.01, overall.dt_diffusion);
    assert_eq!(0.1, overall.dt_mechanics);
    assert_eq!(6.0, overall.dt_phenotype);

    overall.dt_phenotype = -1.0;
    let err = config.write_overall_params(&overall).unwrap_err();
    assert_eq!(ErrorCode::InvalidValue, err.code);
}

#[test]
fn reads_and_writes_substances() {
    let mut config = load();
    let substances = config.read_substance_params().unwrap();
    assert_eq!(2, substances.len());
    assert_eq!("substrate", substances[0].name);
    assert_eq!(100000.0, substances[0].diffusion_coefficient);
    assert_eq!(10.0, substances[0].decay_rate);
    assert_eq!(38.0, substances[1].initial_condition);

    let mut oxygen = config.read_substance("oxygen").unwrap();
    assert_eq!(substances[1], oxygen);
    oxygen.decay_rate = 0.5;
    config.write_substance_params(&[oxygen.clone()]).unwrap();
    assert_eq!(oxygen, config.read_substance("oxygen").unwrap());
    assert_eq!(substances[0], config.read_substance("substrate").unwrap());

    let err = config.read_substance("glucose").unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);

    let mut glucose = oxygen.clone();
    glucose.name = "glucose".to_owned();
    let err = config.write_substance_params(&[glucose]).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);

    let mut unnamed = oxygen;
    unnamed.name = String::new();
    let err = config.write_substance(&unnamed).unwrap_err();
    assert_eq!(ErrorKind::MalformedField, err.kind);
}

#[test]
fn reads_cycle_variants() {
    let config = load();

    let cycle = config.read_cycle_params("default").unwrap();
    assert_eq!(6.0, cycle.code);
    assert_eq!(
        Some(&[300.0, 480.0, 240.0, 60.0][..]),
        cycle.phase_durations()
    );
    assert_eq!(None, cycle.phase_transition_rates());

    let cycle = config.read_cycle_params("cancer").unwrap();
    assert_eq!(None, cycle.phase_durations());
    assert_eq!(
        Some(&[0.00334672, 0.00208333, 0.00416667, 0.0166667][..]),
        cycle.phase_transition_rates()
    );
}

#[test]
fn writes_cycle_durations_in_place() {
    let mut config = load();
    let mut cycle = config.read_cycle_params("default").unwrap();
    cycle.timing = PhaseTiming::Durations(vec![300.0, 480.0, 240.0, 90.0]);
    config.write_cycle_params("default", &cycle).unwrap();
    assert_eq!(cycle, config.read_cycle_params("default").unwrap());

    let xml = config.to_xml().unwrap();
    assert!(xml.contains("<duration index=\"3\" fixed_duration=\"true\">90</duration>"));
    assert!(xml.contains("<duration index=\"0\" fixed_duration=\"false\">300.0</duration>"));
}

#[test]
fn rejects_cycle_variant_switch_and_wrong_phase_count() {
    let mut config = load();
    let cycle = config.read_cycle_params("default").unwrap();

    let mut switched = cycle.clone();
    switched.timing = PhaseTiming::TransitionRates(vec![0.1, 0.2, 0.3, 0.4]);
    let err = config.write_cycle_params("default", &switched).unwrap_err();
    assert_eq!(ErrorKind::VariantConflict, err.kind);

    let mut short = cycle;
    short.timing = PhaseTiming::Durations(vec![300.0, 480.0]);
    let err = config.write_cycle_params("default", &short).unwrap_err();
    assert_eq!(ErrorCode::InvalidValue, err.code);

    assert_eq!(SETTINGS, config.to_xml().unwrap());
}

#[test]
fn reads_death_models() {
    let config = load();
    let models = config.read_death_params("default").unwrap();
    assert_eq!(2, models.len());

    let apoptosis = &models[0];
    assert_eq!(100.0, apoptosis.code);
    assert_eq!(5.31667e-05, apoptosis.death_rate);
    assert_eq!(Some(&[516.0][..]), apoptosis.phase_durations());
    assert_eq!(None, apoptosis.phase_transition_rates());
    assert_eq!(0.05, apoptosis.unlysed_fluid_change_rate);
    assert_eq!(1.66667e-02, apoptosis.cytoplasmic_biomass_change_rate);
    assert_eq!(2.0, apoptosis.relative_rupture_volume);

    let necrosis = &models[1];
    assert_eq!(101.0, necrosis.code);
    assert_eq!(None, necrosis.phase_durations());
    assert_eq!(Some(&[9e9, 1.15741e-05][..]), necrosis.phase_transition_rates());

    assert_eq!(1, config.read_death_params("cancer").unwrap().len());
}

#[test]
fn writes_death_models_by_code() {
    let mut config = load();
    let models = config.read_death_params("default").unwrap();

    let mut necrosis = models[1].clone();
    necrosis.death_rate = 0.001;
    config.write_death_params("default", &[necrosis.clone()]).unwrap();

    let reread = config.read_death_params("default").unwrap();
    assert_eq!(models[0], reread[0]);
    assert_eq!(necrosis, reread[1]);

    let mut unknown = necrosis;
    unknown.code = 7.0;
    let err = config.write_death_params("default", &[unknown]).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn failed_death_write_leaves_matching_models_untouched() {
    let mut config = load();
    let models = config.read_death_params("default").unwrap();

    let mut apoptosis = models[0].clone();
    apoptosis.death_rate = 0.5;
    let mut unknown = models[1].clone();
    unknown.code = 7.0;
    let err = config
        .write_death_params("default", &[apoptosis, unknown])
        .unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
    assert_eq!(SETTINGS, config.to_xml().unwrap());
}

#[test]
fn reads_volume() {
    let config = load();
    let volume = config.read_volume_params("default").unwrap();
    assert_eq!(2494.0, volume.total_volume);
    assert_eq!(0.75, volume.fluid_fraction);
    assert_eq!(540.0, volume.nuclear);
    assert_eq!(0.05, volume.fluid_change_rate);
    assert_eq!(0.0045, volume.cytoplasmic_bio_change_rate);
    assert_eq!(0.0055, volume.nuclear_bio_change_rate);
    assert_eq!(0.0, volume.calcified_fraction);
    assert_eq!(0.0, volume.calcification_rate);
    assert_eq!(2.0, volume.relative_rupture_volume);
}

#[test]
fn writing_one_volume_field_leaves_the_rest() {
    let mut config = load();
    let before = config.read_volume_params("default").unwrap();
    let cancer_before = subtree(
        &config,
        "cell_definitions/cell_definition[@name='cancer']",
    );

    let mut volume = before.clone();
    volume.nuclear = 100.0;
    config.write_volume_params("default", &volume).unwrap();

    let after = config.read_volume_params("default").unwrap();
    assert_eq!(100.0, after.nuclear);
    assert_eq!(before.total_volume, after.total_volume);
    assert_eq!(before.fluid_fraction, after.fluid_fraction);
    assert_eq!(before.fluid_change_rate, after.fluid_change_rate);
    assert_eq!(before.cytoplasmic_bio_change_rate, after.cytoplasmic_bio_change_rate);
    assert_eq!(before.nuclear_bio_change_rate, after.nuclear_bio_change_rate);
    assert_eq!(before.calcified_fraction, after.calcified_fraction);
    assert_eq!(before.calcification_rate, after.calcification_rate);
    assert_eq!(before.relative_rupture_volume, after.relative_rupture_volume);

    assert_eq!(
        cancer_before,
        subtree(&config, "cell_definitions/cell_definition[@name='cancer']")
    );
    // default is declared first, so only its volume changes
    assert_eq!(
        SETTINGS.replacen(
            "<nuclear units=\"micron^3\">540</nuclear>",
            "<nuclear units=\"micron^3\">100</nuclear>",
            1
        ),
        config.to_xml().unwrap()
    );
}

#[test]
fn reads_mechanics() {
    let config = load();
    let mechanics = config.read_mechanics_params("default").unwrap();
    assert_eq!(0.4, mechanics.cell_cell_adhesion_strength);
    assert_eq!(10.0, mechanics.cell_cell_repulsion_strength);
    assert_eq!(1.25, mechanics.relative_maximum_adhesion_distance);
    assert_eq!(1.8, mechanics.relative_equilibrium_distance);
    assert_eq!(15.12, mechanics.absolute_equilibrium_distance);

    let cancer = config.read_mechanics_params("cancer").unwrap();
    assert_eq!(0.8, cancer.cell_cell_adhesion_strength);
}

#[test]
fn reads_and_writes_motility() {
    let mut config = load();
    let motility = config.read_motility_params("default").unwrap();
    assert_eq!(1.0, motility.speed);
    assert_eq!(1.0, motility.persistence_time);
    assert_eq!(0.5, motility.bias);
    assert!(!motility.motility_enabled);
    assert!(motility.use_2d);
    assert!(!motility.chemotaxis_enabled);
    assert_eq!("substrate", motility.chemotaxis_substrate);
    assert_eq!(1.0, motility.chemotaxis_direction);

    let mut updated = motility.clone();
    updated.chemotaxis_enabled = true;
    updated.chemotaxis_substrate = "oxygen".to_owned();
    config.write_motility_params("default", &updated).unwrap();
    assert_eq!(updated, config.read_motility_params("default").unwrap());
    // unchanged fields keep their original text
    assert!(config.to_xml().unwrap().contains("<migration_bias units=\"dimensionless\">.5</migration_bias>"));

    let mut undeclared = motility;
    undeclared.chemotaxis_substrate = "glucose".to_owned();
    let err = config.write_motility_params("default", &undeclared).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn reads_secretion() {
    let config = load();
    let secretion = config.read_secretion_params("default", "substrate").unwrap();
    assert_eq!("substrate", secretion.name);
    assert_eq!(0.0, secretion.secretion_rate);
    assert_eq!(1.0, secretion.secretion_target);
    assert_eq!(0.0, secretion.uptake_rate);
    assert_eq!(0.0, secretion.net_export_rate);

    let list = config.read_secretion_list("default").unwrap();
    let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(vec!["substrate", "oxygen"], names);
    assert_eq!(secretion, list[0]);

    let err = config.read_secretion_params("cancer", "substrate").unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn writes_secretion() {
    let mut config = load();
    let mut oxygen = config.read_secretion_params("default", "oxygen").unwrap();
    oxygen.uptake_rate = 2.5;
    config.write_secretion_params("default", &oxygen).unwrap();
    assert_eq!(oxygen, config.read_secretion_params("default", "oxygen").unwrap());

    // cancer's oxygen entry is a different element
    let cancer = config.read_secretion_params("cancer", "oxygen").unwrap();
    assert_eq!(10.0, cancer.uptake_rate);

    let mut list = config.read_secretion_list("cancer").unwrap();
    list[0].secretion_rate = 0.25;
    config.write_secretion_list("cancer", &list).unwrap();
    assert_eq!(list, config.read_secretion_list("cancer").unwrap());

    let glucose = Secretion {
        name: "glucose".to_owned(),
        ..oxygen
    };
    let err = config.write_secretion_params("default", &glucose).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn reads_and_writes_custom_data() {
    let mut config = load();
    let custom = config.read_custom_data("default").unwrap();
    assert_eq!(
        vec![
            CustomData {
                name: "sample".to_owned(),
                value: 1.0,
            },
            CustomData {
                name: "receptor".to_owned(),
                value: 0.5,
            },
        ],
        custom
    );

    let update = [CustomData {
        name: "receptor".to_owned(),
        value: 0.75,
    }];
    config.write_custom_data("default", &update).unwrap();
    assert_eq!(0.75, config.read_custom_data("default").unwrap()[1].value);
    assert_eq!(1.0, config.read_custom_data("cancer").unwrap()[0].value);

    let missing = [CustomData {
        name: "oncoprotein".to_owned(),
        value: 2.0,
    }];
    let err = config.write_custom_data("default", &missing).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn user_parameters_skip_non_numeric_entries() {
    let mut config = load();
    let params = config.read_user_parameters().unwrap();
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(vec!["random_seed", "number_of_cells", "tumor_radius"], names);
    assert_eq!(5.0, params[1].value);

    let update = [CustomData {
        name: "number_of_cells".to_owned(),
        value: 50.0,
    }];
    config.write_user_parameters(&update).unwrap();
    assert_eq!(50.0, config.read_user_parameters().unwrap()[1].value);

    let bool_entry = [CustomData {
        name: "use_oxygen".to_owned(),
        value: 1.0,
    }];
    let err = config.write_user_parameters(&bool_entry).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn unknown_cell_type_is_not_found() {
    let mut config = load();
    let err = config.read_cycle_params("tumor").unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
    assert_eq!(ErrorCode::DoesNotExist, err.code);

    let volume = config.read_volume_params("default").unwrap();
    let err = config.write_volume_params("tumor", &volume).unwrap_err();
    assert_eq!(ErrorKind::NotFound, err.kind);
}

#[test]
fn writing_back_what_was_read_changes_nothing() {
    let mut config = load();
    for cell in config.cell_definitions_list().unwrap() {
        let cycle = config.read_cycle_params(&cell).unwrap();
        config.write_cycle_params(&cell, &cycle).unwrap();
        let death = config.read_death_params(&cell).unwrap();
        config.write_death_params(&cell, &death).unwrap();
        let volume = config.read_volume_params(&cell).unwrap();
        config.write_volume_params(&cell, &volume).unwrap();
        let mechanics = config.read_mechanics_params(&cell).unwrap();
        config.write_mechanics_params(&cell, &mechanics).unwrap();
        let motility = config.read_motility_params(&cell).unwrap();
        config.write_motility_params(&cell, &motility).unwrap();
        let secretion = config.read_secretion_list(&cell).unwrap();
        config.write_secretion_list(&cell, &secretion).unwrap();
        let custom = config.read_custom_data(&cell).unwrap();
        config.write_custom_data(&cell, &custom).unwrap();
    }
    let domain = config.read_domain_params().unwrap();
    config.write_domain_params(&domain).unwrap();
    let overall = config.read_overall_params().unwrap();
    config.write_overall_params(&overall).unwrap();
    let substances = config.read_substance_params().unwrap();
    config.write_substance_params(&substances).unwrap();
    let params = config.read_user_parameters().unwrap();
    config.write_user_parameters(&params).unwrap();

    assert_eq!(SETTINGS, config.to_xml().unwrap());
}

#[test]
fn records_serialize_to_json() {
    let config = load();
    let cycle = config.read_cycle_params("cancer").unwrap();
    let json = serde_json::to_string(&cycle).unwrap();
    assert!(json.contains("\"transition_rates\""));
    let parsed: physicell_config::Cycle = serde_json::from_str(&json).unwrap();
    assert_eq!(cycle, parsed);
}
