use std::sync::Arc;

use crate::simulation::energy::{EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::SimResult;
use crate::simulation::id::Id;
use crate::simulation::vehicles::engine_log::EngineEnergyLog;
use crate::simulation::vehicles::{DrivetrainMode, EnergyResult, Vehicle};

/// Combustion engine drivetrain. Fuel is not limited, so this drivetrain only passes the energy of
/// the engine model through and keeps a running total of it.
#[derive(Debug, Clone)]
pub struct CombustionDrivetrain {
    engine_model: Arc<dyn EnergyConsumptionModel>,
    engine_log: Arc<dyn EngineEnergyLog>,
    fuel_joules_used: f64,
}

impl CombustionDrivetrain {
    pub fn new(
        engine_model: Arc<dyn EnergyConsumptionModel>,
        engine_log: Arc<dyn EngineEnergyLog>,
    ) -> Self {
        CombustionDrivetrain {
            engine_model,
            engine_log,
            fuel_joules_used: 0.,
        }
    }

    pub fn engine_model(&self) -> &Arc<dyn EnergyConsumptionModel> {
        &self.engine_model
    }

    pub fn fuel_joules_used(&self) -> f64 {
        self.fuel_joules_used
    }

    pub(super) fn apply(
        &mut self,
        vehicle: &Id<Vehicle>,
        traversal: &LinkTraversal,
    ) -> SimResult<EnergyResult> {
        let engine_joules = self.engine_model.consume_energy(traversal)?;
        self.fuel_joules_used += engine_joules;
        self.engine_log
            .record_engine_energy_consumption(vehicle, engine_joules);

        Ok(EnergyResult {
            joules_consumed: engine_joules,
            battery_joules: 0.,
            engine_joules,
            soc_joules: None,
            insufficient_charge: false,
            mode: DrivetrainMode::Engine,
        })
    }
}
