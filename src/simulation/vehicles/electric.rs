use std::sync::Arc;

use crate::simulation::energy::{EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::SimResult;
use crate::simulation::vehicles::battery::Battery;
use crate::simulation::vehicles::{DrivetrainMode, EnergyResult};

/// Battery electric drivetrain.
#[derive(Debug, Clone)]
pub struct ElectricDrivetrain {
    pub(super) battery: Battery,
    electric_model: Arc<dyn EnergyConsumptionModel>,
}

impl ElectricDrivetrain {
    pub fn new(electric_model: Arc<dyn EnergyConsumptionModel>, battery: Battery) -> Self {
        ElectricDrivetrain {
            battery,
            electric_model,
        }
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn electric_model(&self) -> &Arc<dyn EnergyConsumptionModel> {
        &self.electric_model
    }

    pub(super) fn apply(&mut self, traversal: &LinkTraversal) -> SimResult<EnergyResult> {
        let demand = self.electric_model.consume_energy(traversal)?;
        let insufficient_charge = !self.battery.can_supply(demand);
        let drawn = self.battery.discharge(demand);

        Ok(EnergyResult {
            joules_consumed: demand,
            battery_joules: drawn,
            engine_joules: 0.,
            soc_joules: Some(self.battery.soc()),
            insufficient_charge,
            mode: DrivetrainMode::Electric,
        })
    }
}
