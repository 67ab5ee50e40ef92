use nohash_hasher::IntMap;
use serde::{Deserialize, Serialize};

use crate::simulation::config::{FacilityTariff, Parking};
use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::identities::{Facility, Person};
use crate::simulation::parking::ParkingCostModel;

/// Dispatches to the tariff of the parking facility. Facilities without own tariff use the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Parking", into = "Parking")]
pub struct FacilityParkingCost {
    default_model: Box<dyn ParkingCostModel>,
    tariffs: IntMap<Id<Facility>, Box<dyn ParkingCostModel>>,
}

impl FacilityParkingCost {
    pub fn new(default_model: Box<dyn ParkingCostModel>) -> Self {
        FacilityParkingCost {
            default_model,
            tariffs: IntMap::default(),
        }
    }

    pub fn from_config(parking: &Parking) -> SimResult<Self> {
        let mut result = FacilityParkingCost::new(parking.default_model.clone());
        for tariff in &parking.facilities {
            result.add_tariff(Id::create(&tariff.facility), tariff.model.clone())?;
        }
        Ok(result)
    }

    pub fn add_tariff(
        &mut self,
        facility: Id<Facility>,
        model: Box<dyn ParkingCostModel>,
    ) -> SimResult<()> {
        if self.tariffs.contains_key(&facility) {
            return Err(EnergyError::InvalidConfig(format!(
                "parking facility {facility} has more than one tariff"
            )));
        }
        self.tariffs.insert(facility, model);
        Ok(())
    }

    pub fn tariff(&self, facility: &Id<Facility>) -> &dyn ParkingCostModel {
        self.tariffs
            .get(facility)
            .unwrap_or(&self.default_model)
            .as_ref()
    }

    pub fn num_tariffs(&self) -> usize {
        self.tariffs.len()
    }
}

impl TryFrom<Parking> for FacilityParkingCost {
    type Error = EnergyError;

    fn try_from(value: Parking) -> Result<Self, Self::Error> {
        FacilityParkingCost::from_config(&value)
    }
}

impl From<FacilityParkingCost> for Parking {
    fn from(value: FacilityParkingCost) -> Self {
        let mut facilities: Vec<FacilityTariff> = value
            .tariffs
            .into_iter()
            .map(|(facility, model)| FacilityTariff {
                facility: facility.external().to_string(),
                model,
            })
            .collect();
        facilities.sort_by(|a, b| a.facility.cmp(&b.facility));
        Parking {
            default_model: value.default_model,
            facilities,
        }
    }
}

#[typetag::serde]
impl ParkingCostModel for FacilityParkingCost {
    fn parking_cost(
        &self,
        arrival_time: f64,
        duration: f64,
        person_id: &Id<Person>,
        facility_id: &Id<Facility>,
    ) -> f64 {
        self.tariff(facility_id)
            .parking_cost(arrival_time, duration, person_id, facility_id)
    }
}
