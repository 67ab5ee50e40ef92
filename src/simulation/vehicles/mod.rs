use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::simulation::config::{DrivetrainDefinition, VehicleTypeDefinition};
use crate::simulation::energy::{EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::vehicles::battery::Battery;
use crate::simulation::vehicles::combustion::CombustionDrivetrain;
use crate::simulation::vehicles::electric::ElectricDrivetrain;
use crate::simulation::vehicles::engine_log::EngineEnergyLog;
use crate::simulation::vehicles::hybrid::{HybridDrivetrain, HybridPolicy};

pub mod battery;
pub mod combustion;
pub mod electric;
pub mod engine_log;
pub mod garage;
pub mod hybrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrivetrainClass {
    Electric,
    Combustion,
    HybridElectric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrivetrainMode {
    Electric,
    Engine,
}

/// Outcome of one leg.
///
/// For every vehicle with a battery the state of charge after the leg is
/// `soc_before - battery_joules`, and it never drops below zero. If the battery was asked for more
/// energy than it held, `insufficient_charge` is set and the battery is empty afterwards. Electric
/// legs ask the battery for `joules_consumed`. Hybrids switching to their engine for a whole leg
/// don't ask the battery at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyResult {
    /// Energy the leg required in joules. Electric vehicles report the electric demand, even if
    /// the battery could only provide part of it.
    pub joules_consumed: f64,
    /// Energy drawn from the battery.
    pub battery_joules: f64,
    /// Energy provided by the combustion engine.
    pub engine_joules: f64,
    /// State of charge after the leg. `None` for vehicles without battery.
    pub soc_joules: Option<f64>,
    /// The battery could not provide the energy it was asked for and is empty now.
    pub insufficient_charge: bool,
    pub mode: DrivetrainMode,
}

#[derive(Debug, Clone)]
pub enum Drivetrain {
    Electric(ElectricDrivetrain),
    Combustion(CombustionDrivetrain),
    Hybrid(HybridDrivetrain),
}

/// A vehicle agent's physical state. The vehicle is owned by exactly one agent thread while it
/// travels, so it carries no synchronization of its own.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: Id<Vehicle>,
    vehicle_type: Id<VehicleType>,
    drivetrain: Drivetrain,
}

impl Vehicle {
    pub fn new(id: Id<Vehicle>, vehicle_type: Id<VehicleType>, drivetrain: Drivetrain) -> Self {
        Vehicle {
            id,
            vehicle_type,
            drivetrain,
        }
    }

    pub fn id(&self) -> &Id<Vehicle> {
        &self.id
    }

    pub fn vehicle_type(&self) -> &Id<VehicleType> {
        &self.vehicle_type
    }

    pub fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    pub fn class(&self) -> DrivetrainClass {
        match self.drivetrain {
            Drivetrain::Electric(_) => DrivetrainClass::Electric,
            Drivetrain::Combustion(_) => DrivetrainClass::Combustion,
            Drivetrain::Hybrid(_) => DrivetrainClass::HybridElectric,
        }
    }

    pub fn battery(&self) -> Option<&Battery> {
        match &self.drivetrain {
            Drivetrain::Electric(d) => Some(&d.battery),
            Drivetrain::Combustion(_) => None,
            Drivetrain::Hybrid(d) => Some(&d.battery),
        }
    }

    fn battery_mut(&mut self) -> Option<&mut Battery> {
        match &mut self.drivetrain {
            Drivetrain::Electric(d) => Some(&mut d.battery),
            Drivetrain::Combustion(_) => None,
            Drivetrain::Hybrid(d) => Some(&mut d.battery),
        }
    }

    pub fn soc(&self) -> Option<f64> {
        self.battery().map(Battery::soc)
    }

    pub fn battery_capacity(&self) -> Option<f64> {
        self.battery().map(Battery::capacity)
    }

    /// The drive mode the vehicle would use for `traversal`. Only hybrids have a choice, electric
    /// vehicles always drive electrically and combustion vehicles always use their engine.
    pub fn select_drivetrain_mode(&self, traversal: &LinkTraversal) -> SimResult<DrivetrainMode> {
        match &self.drivetrain {
            Drivetrain::Electric(_) => traversal.validate().map(|_| DrivetrainMode::Electric),
            Drivetrain::Combustion(_) => traversal.validate().map(|_| DrivetrainMode::Engine),
            Drivetrain::Hybrid(d) => d.select_drivetrain_mode(traversal),
        }
    }

    /// Mode of the last leg. Hybrids start in electric mode when charged.
    pub fn current_mode(&self) -> DrivetrainMode {
        match &self.drivetrain {
            Drivetrain::Electric(_) => DrivetrainMode::Electric,
            Drivetrain::Combustion(_) => DrivetrainMode::Engine,
            Drivetrain::Hybrid(d) => d.mode(),
        }
    }

    /// Computes the energy for one leg and updates the state of charge. The state of charge never
    /// drops below zero. If the battery can't provide what the leg needs it is emptied and the
    /// result is flagged with `insufficient_charge`. On error the vehicle is left unchanged.
    pub fn apply_energy_consumption(
        &mut self,
        traversal: &LinkTraversal,
    ) -> SimResult<EnergyResult> {
        let result = match &mut self.drivetrain {
            Drivetrain::Electric(d) => d.apply(traversal),
            Drivetrain::Combustion(d) => d.apply(&self.id, traversal),
            Drivetrain::Hybrid(d) => d.apply(&self.id, traversal),
        }?;

        trace!(
            vehicle = %self.id,
            joules = result.joules_consumed,
            soc = ?result.soc_joules,
            mode = ?result.mode,
            insufficient_charge = result.insufficient_charge,
            "applied energy consumption"
        );
        Ok(result)
    }

    /// Stores up to `joules` in the battery and returns the amount which fit.
    pub fn charge(&mut self, joules: f64) -> SimResult<f64> {
        if !joules.is_finite() || joules < 0. {
            return Err(EnergyError::InvalidChargingRecord(format!(
                "charged energy must be finite and non-negative, was {joules}"
            )));
        }
        let id = self.id.to_string();
        self.battery_mut()
            .map(|battery| battery.charge(joules))
            .ok_or(EnergyError::NotChargeable(id))
    }
}

/// Static description of a vehicle type. The consumption models are shared by every vehicle of
/// this type.
#[derive(Debug, Clone)]
pub struct VehicleType {
    pub id: Id<VehicleType>,
    pub drivetrain: DrivetrainType,
}

#[derive(Debug, Clone)]
pub enum DrivetrainType {
    Electric {
        battery_capacity_joules: f64,
        electric_model: Arc<dyn EnergyConsumptionModel>,
    },
    Combustion {
        engine_model: Arc<dyn EnergyConsumptionModel>,
    },
    Hybrid {
        battery_capacity_joules: f64,
        electric_model: Arc<dyn EnergyConsumptionModel>,
        engine_model: Arc<dyn EnergyConsumptionModel>,
        hybrid_model: Option<Arc<dyn EnergyConsumptionModel>>,
        policy: HybridPolicy,
    },
}

impl VehicleType {
    pub fn new(id: Id<VehicleType>, drivetrain: DrivetrainType) -> Self {
        VehicleType { id, drivetrain }
    }

    pub fn from_definition(definition: &VehicleTypeDefinition) -> Self {
        let drivetrain = match &definition.drivetrain {
            DrivetrainDefinition::Electric {
                battery_capacity_joules,
                electric_model,
            } => DrivetrainType::Electric {
                battery_capacity_joules: *battery_capacity_joules,
                electric_model: Arc::from(electric_model.clone()),
            },
            DrivetrainDefinition::Combustion { engine_model } => DrivetrainType::Combustion {
                engine_model: Arc::from(engine_model.clone()),
            },
            DrivetrainDefinition::Hybrid {
                battery_capacity_joules,
                electric_model,
                engine_model,
                hybrid_model,
                policy,
            } => DrivetrainType::Hybrid {
                battery_capacity_joules: *battery_capacity_joules,
                electric_model: Arc::from(electric_model.clone()),
                engine_model: Arc::from(engine_model.clone()),
                hybrid_model: hybrid_model.clone().map(Arc::from),
                policy: *policy,
            },
        };
        VehicleType::new(Id::create(&definition.id), drivetrain)
    }

    pub fn class(&self) -> DrivetrainClass {
        match self.drivetrain {
            DrivetrainType::Electric { .. } => DrivetrainClass::Electric,
            DrivetrainType::Combustion { .. } => DrivetrainClass::Combustion,
            DrivetrainType::Hybrid { .. } => DrivetrainClass::HybridElectric,
        }
    }

    /// Creates the drivetrain of a new vehicle of this type with a fully charged battery.
    pub fn create_drivetrain(&self, engine_log: Arc<dyn EngineEnergyLog>) -> SimResult<Drivetrain> {
        let drivetrain = match &self.drivetrain {
            DrivetrainType::Electric {
                battery_capacity_joules,
                electric_model,
            } => Drivetrain::Electric(ElectricDrivetrain::new(
                electric_model.clone(),
                Battery::new(*battery_capacity_joules)?,
            )),
            DrivetrainType::Combustion { engine_model } => {
                Drivetrain::Combustion(CombustionDrivetrain::new(engine_model.clone(), engine_log))
            }
            DrivetrainType::Hybrid {
                battery_capacity_joules,
                electric_model,
                engine_model,
                hybrid_model,
                policy,
            } => {
                let mut hybrid = HybridDrivetrain::new(
                    electric_model.clone(),
                    engine_model.clone(),
                    Battery::new(*battery_capacity_joules)?,
                )
                .with_policy(*policy)
                .with_engine_log(engine_log);
                if let Some(hybrid_model) = hybrid_model {
                    hybrid = hybrid.with_hybrid_model(hybrid_model.clone());
                }
                Drivetrain::Hybrid(hybrid)
            }
        };
        Ok(drivetrain)
    }
}
