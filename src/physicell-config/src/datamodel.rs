// Copyright 2026 The PhysiCell Config Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Plain records for each parameter group. Records are built fresh on
//! every read and hold no reference back into the document.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub use_2d: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overall {
    pub max_time: f64,
    pub dt_diffusion: f64,
    pub dt_mechanics: f64,
    pub dt_phenotype: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    pub name: String,
    pub diffusion_coefficient: f64,
    pub decay_rate: f64,
    pub initial_condition: f64,
    pub dirichlet_boundary_condition: f64,
}

/// How a phase model is timed: either fixed durations per phase or rates
/// for each transition between phases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTiming {
    Durations(Vec<f64>),
    TransitionRates(Vec<f64>),
}

impl PhaseTiming {
    pub fn values(&self) -> &[f64] {
        match self {
            PhaseTiming::Durations(v) | PhaseTiming::TransitionRates(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            PhaseTiming::Durations(_) => "phase_durations",
            PhaseTiming::TransitionRates(_) => "phase_transition_rates",
        }
    }
}

/// Number of phases of the standard PhysiCell cycle and death models.
pub fn phase_count(code: f64) -> Option<usize> {
    if code.fract() != 0.0 {
        return None;
    }
    match code as i64 {
        0 => Some(3),   // advanced Ki67
        1 => Some(2),   // basic Ki67
        2 => Some(3),   // flow cytometry
        5 => Some(1),   // live
        6 => Some(4),   // flow cytometry separated
        7 => Some(2),   // cycling quiescent
        100 => Some(1), // apoptosis
        101 => Some(2), // necrosis
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub code: f64,
    pub timing: PhaseTiming,
}

impl Cycle {
    pub fn phase_durations(&self) -> Option<&[f64]> {
        match self.timing {
            PhaseTiming::Durations(ref v) => Some(v),
            PhaseTiming::TransitionRates(_) => None,
        }
    }

    pub fn phase_transition_rates(&self) -> Option<&[f64]> {
        match self.timing {
            PhaseTiming::TransitionRates(ref v) => Some(v),
            PhaseTiming::Durations(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Death {
    pub code: f64,
    pub death_rate: f64,
    pub timing: PhaseTiming,
    pub unlysed_fluid_change_rate: f64,
    pub lysed_fluid_change_rate: f64,
    pub cytoplasmic_biomass_change_rate: f64,
    pub nuclear_biomass_change_rate: f64,
    pub calcification_rate: f64,
    pub relative_rupture_volume: f64,
}

impl Death {
    pub fn phase_durations(&self) -> Option<&[f64]> {
        match self.timing {
            PhaseTiming::Durations(ref v) => Some(v),
            PhaseTiming::TransitionRates(_) => None,
        }
    }

    pub fn phase_transition_rates(&self) -> Option<&[f64]> {
        match self.timing {
            PhaseTiming::TransitionRates(ref v) => Some(v),
            PhaseTiming::Durations(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub total_volume: f64,
    pub fluid_fraction: f64,
    pub nuclear: f64,
    pub fluid_change_rate: f64,
    pub cytoplasmic_bio_change_rate: f64,
    pub nuclear_bio_change_rate: f64,
    pub calcified_fraction: f64,
    pub calcification_rate: f64,
    pub relative_rupture_volume: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mechanics {
    pub cell_cell_adhesion_strength: f64,
    pub cell_cell_repulsion_strength: f64,
    pub relative_maximum_adhesion_distance: f64,
    pub relative_equilibrium_distance: f64,
    pub absolute_equilibrium_distance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motility {
    pub speed: f64,
    pub persistence_time: f64,
    pub bias: f64,
    pub motility_enabled: bool,
    pub use_2d: bool,
    pub chemotaxis_enabled: bool,
    pub chemotaxis_substrate: String,
    pub chemotaxis_direction: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Secretion {
    pub name: String,
    pub secretion_rate: f64,
    pub secretion_target: f64,
    pub uptake_rate: f64,
    pub net_export_rate: f64,
}

/// A free-form named parameter, either per cell type (`custom_data`) or
/// global (`user_parameters`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    pub name: String,
    pub value: f64,
}

#[test]
fn test_phase_count() {
    assert_eq!(Some(4), phase_count(6.0));
    assert_eq!(Some(1), phase_count(100.0));
    assert_eq!(Some(2), phase_count(101.0));
    assert_eq!(None, phase_count(6.5));
    assert_eq!(None, phase_count(42.0));
}

#[test]
fn test_variant_accessors() {
    let cycle = Cycle {
        code: 6.0,
        timing: PhaseTiming::TransitionRates(vec![0.1, 0.2]),
    };
    assert_eq!(None, cycle.phase_durations());
    assert_eq!(Some(&[0.1, 0.2][..]), cycle.phase_transition_rates());
    assert_eq!("phase_transition_rates", cycle.timing.variant_name());
    assert_eq!(2, cycle.timing.len());
}
