use std::fmt::Debug;

use derive_builder::Builder;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};

use crate::simulation::error::{EnergyError, SimResult};

pub mod constant;
pub mod grade_aware;
pub mod speed_dependent;

pub use constant::ConstantRateModel;
pub use grade_aware::GradeAwareModel;
pub use speed_dependent::{SpeedConsumption, SpeedDependentModel};

/// The travel conditions of one vehicle on one link, as handed over by the host's network layer.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkTraversal {
    /// Length of the link in meters.
    pub length_m: f64,
    /// Time the vehicle needed to traverse the link in seconds.
    pub travel_time_s: f64,
    /// Rise over run. Positive values are uphill.
    #[builder(default)]
    #[serde(default)]
    pub grade: f64,
}

impl LinkTraversal {
    pub fn new(length_m: f64, travel_time_s: f64) -> Self {
        LinkTraversal {
            length_m,
            travel_time_s,
            grade: 0.,
        }
    }

    pub fn with_grade(mut self, grade: f64) -> Self {
        self.grade = grade;
        self
    }

    /// Average speed in m/s. A traversal without duration has no meaningful speed and reports 0.
    pub fn average_speed(&self) -> f64 {
        if self.travel_time_s > 0. {
            self.length_m / self.travel_time_s
        } else {
            0.
        }
    }

    /// The first `fraction` of this traversal, driven at the same speed and grade.
    pub fn scaled(&self, fraction: f64) -> Self {
        LinkTraversal {
            length_m: self.length_m * fraction,
            travel_time_s: self.travel_time_s * fraction,
            grade: self.grade,
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.length_m.is_finite() || self.length_m < 0. {
            return Err(EnergyError::InvalidTraversalInput(format!(
                "link length must be finite and non-negative, was {}",
                self.length_m
            )));
        }
        if !self.travel_time_s.is_finite() || self.travel_time_s < 0. {
            return Err(EnergyError::InvalidTraversalInput(format!(
                "travel time must be finite and non-negative, was {}",
                self.travel_time_s
            )));
        }
        if !self.grade.is_finite() {
            return Err(EnergyError::InvalidTraversalInput(format!(
                "grade must be finite, was {}",
                self.grade
            )));
        }
        Ok(())
    }
}

impl From<LinkTraversalBuilderError> for EnergyError {
    fn from(value: LinkTraversalBuilderError) -> Self {
        EnergyError::InvalidTraversalInput(value.to_string())
    }
}

/// Computes how much energy a drivetrain needs to traverse a link. Implementations hold
/// calibration data only. They are shared between all vehicles of a type via `Arc` and are never
/// mutated after construction, which makes them safe to call from many agent threads at once.
#[typetag::serde(tag = "type")]
pub trait EnergyConsumptionModel: Debug + Send + Sync + DynClone {
    /// Energy in joules for a traversal which has already been validated.
    fn energy_for_traversal(&self, traversal: &LinkTraversal) -> f64;

    /// Energy in joules needed for `traversal`. Never negative.
    fn consume_energy(&self, traversal: &LinkTraversal) -> SimResult<f64> {
        traversal.validate()?;
        Ok(self.energy_for_traversal(traversal).max(0.))
    }
}

dyn_clone::clone_trait_object!(EnergyConsumptionModel);

pub(crate) fn check_parameter(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(EnergyError::InvalidConfig(format!(
            "{name} must be finite and non-negative, was {value}"
        )))
    }
}
