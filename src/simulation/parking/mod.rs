use std::fmt::Debug;

use dyn_clone::DynClone;

use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::identities::{Facility, Person};

pub mod facility;
pub mod tariffs;

pub use facility::FacilityParkingCost;
pub use tariffs::{
    DurationTier, DurationTieredParkingCost, FlatRateParkingCost, FreeParking, RateWindow,
    TimeOfDayParkingCost,
};

pub const SECONDS_PER_HOUR: f64 = 3600.;
pub const SECONDS_PER_DAY: f64 = 86400.;

/// Prices a parking stay. Implementations are stateless tariffs which are shared between all agent
/// threads.
#[typetag::serde(tag = "type")]
pub trait ParkingCostModel: Debug + Send + Sync + DynClone {
    /// Cost of a validated stay.
    fn parking_cost(
        &self,
        arrival_time: f64,
        duration: f64,
        person_id: &Id<Person>,
        facility_id: &Id<Facility>,
    ) -> f64;

    /// Cost of parking at `facility_id` from `arrival_time` for `duration` seconds. Zero means
    /// parking is free.
    fn calc_parking_cost(
        &self,
        arrival_time: f64,
        duration: f64,
        person_id: &Id<Person>,
        facility_id: &Id<Facility>,
    ) -> SimResult<f64> {
        validate_query(arrival_time, duration)?;
        Ok(self
            .parking_cost(arrival_time, duration, person_id, facility_id)
            .max(0.))
    }
}

dyn_clone::clone_trait_object!(ParkingCostModel);

pub fn validate_query(arrival_time: f64, duration: f64) -> SimResult<()> {
    let valid = |v: f64| v.is_finite() && v >= 0.;
    if valid(arrival_time) && valid(duration) {
        Ok(())
    } else {
        Err(EnergyError::InvalidParkingQuery {
            arrival_time,
            duration,
        })
    }
}

pub(crate) fn check_price(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(EnergyError::InvalidConfig(format!(
            "{name} must be finite and non-negative, was {value}"
        )))
    }
}
