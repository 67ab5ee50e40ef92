use serde::{Deserialize, Serialize};

use crate::simulation::energy::{check_parameter, EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::{EnergyError, SimResult};

/// Consumes the same amount of energy for every meter, independent of speed and grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConstantRateParams", into = "ConstantRateParams")]
pub struct ConstantRateModel {
    joules_per_meter: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConstantRateParams {
    joules_per_meter: f64,
}

impl ConstantRateModel {
    pub fn new(joules_per_meter: f64) -> SimResult<Self> {
        check_parameter("joules_per_meter", joules_per_meter)?;
        Ok(ConstantRateModel { joules_per_meter })
    }

    pub fn joules_per_meter(&self) -> f64 {
        self.joules_per_meter
    }
}

impl TryFrom<ConstantRateParams> for ConstantRateModel {
    type Error = EnergyError;

    fn try_from(value: ConstantRateParams) -> Result<Self, Self::Error> {
        ConstantRateModel::new(value.joules_per_meter)
    }
}

impl From<ConstantRateModel> for ConstantRateParams {
    fn from(value: ConstantRateModel) -> Self {
        ConstantRateParams {
            joules_per_meter: value.joules_per_meter,
        }
    }
}

#[typetag::serde]
impl EnergyConsumptionModel for ConstantRateModel {
    fn energy_for_traversal(&self, traversal: &LinkTraversal) -> f64 {
        traversal.length_m * self.joules_per_meter
    }
}
