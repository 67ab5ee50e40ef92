use std::sync::Arc;

use nohash_hasher::IntMap;
use tracing::debug;

use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::identities::Person;
use crate::simulation::vehicles::engine_log::{EngineEnergyLog, NoEngineLog};
use crate::simulation::vehicles::{Vehicle, VehicleType};

/// Holds the vehicle types of a run and all vehicles which are currently parked. A vehicle leaves
/// the garage when an agent starts driving it and returns when the agent parks it, so that each
/// vehicle is owned by exactly one agent thread at a time.
#[derive(Debug)]
pub struct Garage {
    pub vehicles: IntMap<Id<Vehicle>, Vehicle>,
    pub vehicle_types: IntMap<Id<VehicleType>, VehicleType>,
    engine_log: Arc<dyn EngineEnergyLog>,
}

impl Default for Garage {
    fn default() -> Self {
        Garage::new()
    }
}

impl Garage {
    pub fn new() -> Self {
        Garage {
            vehicles: Default::default(),
            vehicle_types: Default::default(),
            engine_log: Arc::new(NoEngineLog),
        }
    }

    /// Engine log handed to every vehicle created afterwards.
    pub fn with_engine_log(mut self, engine_log: Arc<dyn EngineEnergyLog>) -> Self {
        self.engine_log = engine_log;
        self
    }

    pub fn add_veh_type(&mut self, veh_type: VehicleType) -> SimResult<()> {
        if self.vehicle_types.contains_key(&veh_type.id) {
            return Err(EnergyError::DuplicateVehicleType(veh_type.id.to_string()));
        }
        debug!(vehicle_type = %veh_type.id, class = ?veh_type.class(), "Added vehicle type");
        self.vehicle_types.insert(veh_type.id.clone(), veh_type);
        Ok(())
    }

    pub fn vehicle_type(&self, type_id: &Id<VehicleType>) -> Option<&VehicleType> {
        self.vehicle_types.get(type_id)
    }

    /// Creates a vehicle of the given type with a full battery without parking it.
    pub fn create_veh(&self, id: Id<Vehicle>, type_id: &Id<VehicleType>) -> SimResult<Vehicle> {
        let veh_type = self
            .vehicle_types
            .get(type_id)
            .ok_or_else(|| EnergyError::UnknownVehicleType(type_id.to_string()))?;
        let drivetrain = veh_type.create_drivetrain(self.engine_log.clone())?;
        Ok(Vehicle::new(id, type_id.clone(), drivetrain))
    }

    /// Creates and parks the vehicle of `type_id` belonging to a person. The vehicle id is derived
    /// from both ids.
    pub fn add_veh_by_type(
        &mut self,
        person_id: &Id<Person>,
        type_id: &Id<VehicleType>,
    ) -> SimResult<Id<Vehicle>> {
        let veh_id_ext = format!("{}_{}", person_id.external(), type_id.external());
        let veh_id: Id<Vehicle> = Id::create(&veh_id_ext);
        let vehicle = self.create_veh(veh_id.clone(), type_id)?;
        self.park_veh(vehicle);
        Ok(veh_id)
    }

    pub fn veh_id(&self, person_id: &Id<Person>, type_id: &Id<VehicleType>) -> Option<Id<Vehicle>> {
        let external = format!("{}_{}", person_id.external(), type_id.external());
        Id::try_get_from_ext(&external)
    }

    pub fn park_veh(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id().clone(), vehicle);
    }

    pub fn unpark_veh(&mut self, id: &Id<Vehicle>) -> SimResult<Vehicle> {
        self.vehicles
            .remove(id)
            .ok_or_else(|| EnergyError::VehicleNotInGarage(id.to_string()))
    }

    pub fn parked(&self, id: &Id<Vehicle>) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }
}
