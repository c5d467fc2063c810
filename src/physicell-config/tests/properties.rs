// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for group writes using proptest.
//!
//! These tests verify that:
//! 1. Reading a group back after writing it yields the written record
//! 2. Writing the same record twice leaves the same document as writing it once
//! 3. A write never changes another cell type's subtree

use proptest::prelude::*;

use physicell_config::{
    ConfigFile, CustomData, Death, Domain, ElementPath, Mechanics, Motility, Overall,
    PhaseTiming, Secretion, Volume,
};

const SETTINGS: &str = include_str!("../../../test/PhysiCell_settings.xml");

const CANCER: &str = "cell_definitions/cell_definition[@name='cancer']";

fn load() -> ConfigFile {
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

fn finite_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(1.0),
        (-1000i32..1000).prop_map(|x| x as f64),
        (-100i32..100).prop_map(|x| x as f64 / 8.0),
        -1e6f64..1e6,
        1e-9f64..1e-3,
    ]
}

// values that serde_json parses back exactly
fn json_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        (-1000i32..1000).prop_map(|x| x as f64),
        (-100i32..100).prop_map(|x| x as f64 / 4.0),
    ]
}

fn positive_f64() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), 1e-6f64..1e6]
}

fn substance_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("substrate".to_owned()), Just("oxygen".to_owned())]
}

fn axis() -> impl Strategy<Value = (f64, f64)> {
    (-1e5f64..1e5, 1e-3f64..1e5).prop_map(|(min, span)| (min, min + span))
}

fn domain_strategy() -> impl Strategy<Value = Domain> {
    (
        axis(),
        axis(),
        axis(),
        positive_f64(),
        positive_f64(),
        positive_f64(),
        any::<bool>(),
    )
        .prop_map(|((x_min, x_max), (y_min, y_max), (z_min, z_max), dx, dy, dz, use_2d)| {
            Domain {
                x_min,
                x_max,
                y_min,
                y_max,
                z_min,
                z_max,
                dx,
                dy,
                dz,
                use_2d,
            }
        })
}

fn overall_strategy() -> impl Strategy<Value = Overall> {
    (positive_f64(), positive_f64(), positive_f64(), positive_f64()).prop_map(
        |(max_time, dt_diffusion, dt_mechanics, dt_phenotype)| Overall {
            max_time,
            dt_diffusion,
            dt_mechanics,
            dt_phenotype,
        },
    )
}

fn volume_strategy() -> impl Strategy<Value = Volume> {
    proptest::collection::vec(finite_f64(), 9).prop_map(|v| Volume {
        total_volume: v[0],
        fluid_fraction: v[1],
        nuclear: v[2],
        fluid_change_rate: v[3],
        cytoplasmic_bio_change_rate: v[4],
        nuclear_bio_change_rate: v[5],
        calcified_fraction: v[6],
        calcification_rate: v[7],
        relative_rupture_volume: v[8],
    })
}

fn mechanics_strategy() -> impl Strategy<Value = Mechanics> {
    proptest::collection::vec(finite_f64(), 5).prop_map(|v| Mechanics {
        cell_cell_adhesion_strength: v[0],
        cell_cell_repulsion_strength: v[1],
        relative_maximum_adhesion_distance: v[2],
        relative_equilibrium_distance: v[3],
        absolute_equilibrium_distance: v[4],
    })
}

fn motility_strategy() -> impl Strategy<Value = Motility> {
    (
        (finite_f64(), finite_f64(), finite_f64(), finite_f64()),
        (any::<bool>(), any::<bool>(), any::<bool>()),
        substance_name(),
    )
        .prop_map(
            |(
                (speed, persistence_time, bias, chemotaxis_direction),
                (motility_enabled, use_2d, chemotaxis_enabled),
                chemotaxis_substrate,
            )| Motility {
                speed,
                persistence_time,
                bias,
                motility_enabled,
                use_2d,
                chemotaxis_enabled,
                chemotaxis_substrate,
                chemotaxis_direction,
            },
        )
}

fn secretion_strategy() -> impl Strategy<Value = Secretion> {
    (substance_name(), proptest::collection::vec(finite_f64(), 4)).prop_map(|(name, v)| {
        Secretion {
            name,
            secretion_rate: v[0],
            secretion_target: v[1],
            uptake_rate: v[2],
            net_export_rate: v[3],
        }
    })
}

/// Death records keyed like the `default` cell type's two models.
fn death_strategy() -> impl Strategy<Value = Vec<Death>> {
    (
        proptest::collection::vec(finite_f64(), 7),
        proptest::collection::vec(finite_f64(), 7),
        positive_f64(),
        (positive_f64(), positive_f64()),
    )
        .prop_map(|(a, n, duration, (r0, r1))| {
            let model = |code: f64, v: &[f64], timing: PhaseTiming| Death {
                code,
                death_rate: v[0],
                timing,
                unlysed_fluid_change_rate: v[1],
                lysed_fluid_change_rate: v[2],
                cytoplasmic_biomass_change_rate: v[3],
                nuclear_biomass_change_rate: v[4],
                calcification_rate: v[5],
                relative_rupture_volume: v[6],
            };
            vec![
                model(100.0, &a, PhaseTiming::Durations(vec![duration])),
                model(101.0, &n, PhaseTiming::TransitionRates(vec![r0, r1])),
            ]
        })
}

fn durations_strategy() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(positive_f64(), 4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn domain_roundtrip(domain in domain_strategy()) {
        let mut config = load();
        config.write_domain_params(&domain).unwrap();
        prop_assert_eq!(domain, config.read_domain_params().unwrap());
    }

    #[test]
    fn overall_roundtrip(overall in overall_strategy()) {
        let mut config = load();
        config.write_overall_params(&overall).unwrap();
        prop_assert_eq!(overall, config.read_overall_params().unwrap());
    }

    #[test]
    fn volume_roundtrip_is_idempotent_and_isolated(volume in volume_strategy()) {
        let mut config = load();
        let cancer = subtree(&config, CANCER);
        config.write_volume_params("default", &volume).unwrap();
        prop_assert_eq!(&volume, &config.read_volume_params("default").unwrap());

        let once = config.to_xml().unwrap();
        config.write_volume_params("default", &volume).unwrap();
        prop_assert_eq!(once, config.to_xml().unwrap());
        prop_assert_eq!(cancer, subtree(&config, CANCER));
    }

    #[test]
    fn mechanics_write_leaves_cancer_untouched(mechanics in mechanics_strategy()) {
        let mut config = load();
        let cancer = subtree(&config, CANCER);
        config.write_mechanics_params("default", &mechanics).unwrap();
        prop_assert_eq!(&mechanics, &config.read_mechanics_params("default").unwrap());
        prop_assert_eq!(cancer, subtree(&config, CANCER));
    }

    #[test]
    fn motility_roundtrip(motility in motility_strategy()) {
        let mut config = load();
        config.write_motility_params("cancer", &motility).unwrap();
        prop_assert_eq!(motility, config.read_motility_params("cancer").unwrap());
    }

    #[test]
    fn secretion_roundtrip(secretion in secretion_strategy()) {
        let mut config = load();
        config.write_secretion_params("default", &secretion).unwrap();
        let name = secretion.name.clone();
        prop_assert_eq!(
            secretion,
            config.read_secretion_params("default", &name).unwrap()
        );
    }

    #[test]
    fn death_roundtrip_is_idempotent(models in death_strategy()) {
        let mut config = load();
        let cancer = subtree(&config, CANCER);
        config.write_death_params("default", &models).unwrap();
        prop_assert_eq!(&models, &config.read_death_params("default").unwrap());

        let once = config.to_xml().unwrap();
        config.write_death_params("default", &models).unwrap();
        prop_assert_eq!(once, config.to_xml().unwrap());
        prop_assert_eq!(cancer, subtree(&config, CANCER));
    }

    #[test]
    fn cycle_roundtrip(durations in durations_strategy()) {
        let mut config = load();
        let mut cycle = config.read_cycle_params("default").unwrap();
        cycle.timing = PhaseTiming::Durations(durations);
        config.write_cycle_params("default", &cycle).unwrap();
        prop_assert_eq!(cycle, config.read_cycle_params("default").unwrap());
    }

    #[test]
    fn single_field_update_is_isolated(nuclear in finite_f64()) {
        let mut config = load();
        let before = config.read_volume_params("default").unwrap();
        let mut volume = before.clone();
        volume.nuclear = nuclear;
        config.write_volume_params("default", &volume).unwrap();

        let after = config.read_volume_params("default").unwrap();
        prop_assert_eq!(Volume { nuclear: before.nuclear, ..after }, before);
    }

    #[test]
    fn user_parameter_roundtrip(value in finite_f64()) {
        let mut config = load();
        let entry = CustomData {
            name: "tumor_radius".to_owned(),
            value,
        };
        config.write_user_parameters(&[entry.clone()]).unwrap();
        let params = config.read_user_parameters().unwrap();
        prop_assert_eq!(&entry, &params[2]);
        prop_assert_eq!(3, params.len());
    }

    #[test]
    fn records_roundtrip_through_json(
        v in proptest::collection::vec(json_f64(), 4),
        rates in proptest::collection::vec(json_f64(), 1..5),
    ) {
        let secretion = Secretion {
            name: "oxygen".to_owned(),
            secretion_rate: v[0],
            secretion_target: v[1],
            uptake_rate: v[2],
            net_export_rate: v[3],
        };
        let json = serde_json::to_string(&secretion).unwrap();
        let parsed: Secretion = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(secretion, parsed);

        let timing = PhaseTiming::TransitionRates(rates);
        let json = serde_json::to_string(&timing).unwrap();
        let parsed: PhaseTiming = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(timing, parsed);
    }
}
