use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::simulation::energy::{check_parameter, EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::{EnergyError, SimResult};

/// One point of a consumption curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedConsumption {
    pub speed_m_per_s: f64,
    pub joules_per_meter: f64,
}

/// Looks up the consumption per meter by the average speed on the link. Values between two points
/// of the table are interpolated linearly, speeds outside of the table use the closest point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpeedTable", into = "SpeedTable")]
pub struct SpeedDependentModel {
    table: Vec<SpeedConsumption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpeedTable {
    table: Vec<SpeedConsumption>,
}

impl SpeedDependentModel {
    pub fn new(mut table: Vec<SpeedConsumption>) -> SimResult<Self> {
        if table.is_empty() {
            return Err(EnergyError::InvalidConfig(String::from(
                "speed dependent consumption table must not be empty",
            )));
        }
        for point in &table {
            check_parameter("speed_m_per_s", point.speed_m_per_s)?;
            check_parameter("joules_per_meter", point.joules_per_meter)?;
        }
        table.sort_by(|a, b| a.speed_m_per_s.total_cmp(&b.speed_m_per_s));
        Ok(SpeedDependentModel { table })
    }

    pub fn table(&self) -> &[SpeedConsumption] {
        &self.table
    }

    pub fn joules_per_meter(&self, speed: f64) -> f64 {
        // the table is non-empty and sorted, see new()
        let first = self.table[0];
        let last = self.table[self.table.len() - 1];
        if speed <= first.speed_m_per_s {
            return first.joules_per_meter;
        }
        if speed >= last.speed_m_per_s {
            return last.joules_per_meter;
        }

        self.table
            .iter()
            .tuple_windows()
            .find(|(lower, upper)| lower.speed_m_per_s <= speed && speed <= upper.speed_m_per_s)
            .map(|(lower, upper)| {
                let span = upper.speed_m_per_s - lower.speed_m_per_s;
                if span <= 0. {
                    return lower.joules_per_meter;
                }
                let weight = (speed - lower.speed_m_per_s) / span;
                lower.joules_per_meter + weight * (upper.joules_per_meter - lower.joules_per_meter)
            })
            .unwrap_or(last.joules_per_meter)
    }
}

impl TryFrom<SpeedTable> for SpeedDependentModel {
    type Error = EnergyError;

    fn try_from(value: SpeedTable) -> Result<Self, Self::Error> {
        SpeedDependentModel::new(value.table)
    }
}

impl From<SpeedDependentModel> for SpeedTable {
    fn from(value: SpeedDependentModel) -> Self {
        SpeedTable { table: value.table }
    }
}

#[typetag::serde]
impl EnergyConsumptionModel for SpeedDependentModel {
    fn energy_for_traversal(&self, traversal: &LinkTraversal) -> f64 {
        traversal.length_m * self.joules_per_meter(traversal.average_speed())
    }
}
