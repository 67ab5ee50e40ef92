use serde::{Deserialize, Serialize};

use crate::simulation::energy::{check_parameter, EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::{EnergyError, SimResult};

const GRAVITY: f64 = 9.81;

/// Adds the potential energy of climbing a link to a base model. Uphill, the drivetrain has to
/// provide `m * g * h / drivetrain_efficiency` on top of the base consumption. Downhill, the
/// `regeneration_efficiency` share of the released energy is credited. The result never drops
/// below zero, so a vehicle can't gain energy from traversing a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GradeAwareParams", into = "GradeAwareParams")]
pub struct GradeAwareModel {
    base: Box<dyn EnergyConsumptionModel>,
    vehicle_mass_kg: f64,
    drivetrain_efficiency: f64,
    regeneration_efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GradeAwareParams {
    base: Box<dyn EnergyConsumptionModel>,
    vehicle_mass_kg: f64,
    drivetrain_efficiency: f64,
    #[serde(default)]
    regeneration_efficiency: f64,
}

impl GradeAwareModel {
    pub fn new(
        base: Box<dyn EnergyConsumptionModel>,
        vehicle_mass_kg: f64,
        drivetrain_efficiency: f64,
        regeneration_efficiency: f64,
    ) -> SimResult<Self> {
        check_parameter("vehicle_mass_kg", vehicle_mass_kg)?;
        if !(drivetrain_efficiency > 0. && drivetrain_efficiency <= 1.) {
            return Err(EnergyError::InvalidConfig(format!(
                "drivetrain_efficiency must be in (0, 1], was {drivetrain_efficiency}"
            )));
        }
        if !(0. ..=1.).contains(&regeneration_efficiency) {
            return Err(EnergyError::InvalidConfig(format!(
                "regeneration_efficiency must be in [0, 1], was {regeneration_efficiency}"
            )));
        }
        Ok(GradeAwareModel {
            base,
            vehicle_mass_kg,
            drivetrain_efficiency,
            regeneration_efficiency,
        })
    }

    /// Height difference in meters. The link length is measured along the slope.
    fn elevation_change(traversal: &LinkTraversal) -> f64 {
        traversal.length_m * traversal.grade / (1. + traversal.grade * traversal.grade).sqrt()
    }
}

impl TryFrom<GradeAwareParams> for GradeAwareModel {
    type Error = EnergyError;

    fn try_from(value: GradeAwareParams) -> Result<Self, Self::Error> {
        GradeAwareModel::new(
            value.base,
            value.vehicle_mass_kg,
            value.drivetrain_efficiency,
            value.regeneration_efficiency,
        )
    }
}

impl From<GradeAwareModel> for GradeAwareParams {
    fn from(value: GradeAwareModel) -> Self {
        GradeAwareParams {
            base: value.base,
            vehicle_mass_kg: value.vehicle_mass_kg,
            drivetrain_efficiency: value.drivetrain_efficiency,
            regeneration_efficiency: value.regeneration_efficiency,
        }
    }
}

#[typetag::serde]
impl EnergyConsumptionModel for GradeAwareModel {
    fn energy_for_traversal(&self, traversal: &LinkTraversal) -> f64 {
        let base = self.base.energy_for_traversal(traversal);
        let potential = self.vehicle_mass_kg * GRAVITY * Self::elevation_change(traversal);

        let total = if potential >= 0. {
            base + potential / self.drivetrain_efficiency
        } else {
            base + potential * self.regeneration_efficiency
        };
        total.max(0.)
    }
}
