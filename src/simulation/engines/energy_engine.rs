use std::sync::Arc;

use tracing::{debug, instrument};

use crate::simulation::charging::{charge_at_link, ChargingLog, ChargingLogRow};
use crate::simulation::energy::LinkTraversal;
use crate::simulation::error::SimResult;
use crate::simulation::id::Id;
use crate::simulation::identities::{Facility, Link, Person};
use crate::simulation::parking::ParkingCostModel;
use crate::simulation::vehicles::{EnergyResult, Vehicle};

/// Adapter between the mobility simulation and the energy core. Each agent thread holds its own
/// clone. The engine keeps no vehicle state, vehicles are passed in by the thread which owns them.
#[derive(Debug, Clone)]
pub struct EnergyEngine {
    parking: Arc<dyn ParkingCostModel>,
    charging_log: Arc<ChargingLog>,
}

impl EnergyEngine {
    pub fn new(parking: Arc<dyn ParkingCostModel>, charging_log: Arc<ChargingLog>) -> Self {
        EnergyEngine {
            parking,
            charging_log,
        }
    }

    /// Called when `vehicle` has left a link.
    #[instrument(level = "trace", skip(self, vehicle), fields(vehicle = %vehicle.id()))]
    pub fn on_leg(
        &self,
        vehicle: &mut Vehicle,
        traversal: &LinkTraversal,
    ) -> SimResult<EnergyResult> {
        let result = vehicle.apply_energy_consumption(traversal)?;
        if result.insufficient_charge {
            debug!(vehicle = %vehicle.id(), mode = ?result.mode, "battery depleted");
        }
        Ok(result)
    }

    /// Charges `vehicle` at a charger of `power_w` watts.
    #[instrument(level = "trace", skip(self, vehicle), fields(vehicle = %vehicle.id()))]
    pub fn on_charging(
        &self,
        vehicle: &mut Vehicle,
        link: &Id<Link>,
        start_time: f64,
        duration: f64,
        power_w: f64,
    ) -> SimResult<ChargingLogRow> {
        charge_at_link(
            vehicle,
            link,
            start_time,
            duration,
            power_w,
            &self.charging_log,
        )
    }

    /// Records a charging session whose energy was determined by the host.
    pub fn on_charging_session(
        &self,
        vehicle: &Id<Vehicle>,
        link: &Id<Link>,
        start_time: f64,
        duration: f64,
        energy_joules: f64,
    ) -> SimResult<ChargingLogRow> {
        self.charging_log.record_session(
            vehicle.clone(),
            link.clone(),
            start_time,
            duration,
            energy_joules,
        )
    }

    #[instrument(level = "trace", skip(self))]
    pub fn on_parking(
        &self,
        arrival_time: f64,
        duration: f64,
        person: &Id<Person>,
        facility: &Id<Facility>,
    ) -> SimResult<f64> {
        self.parking
            .calc_parking_cost(arrival_time, duration, person, facility)
    }

    pub fn charging_log(&self) -> &Arc<ChargingLog> {
        &self.charging_log
    }
}
