use std::sync::Arc;

use tracing::info;

use crate::simulation::charging::{ChargingLog, ChargingLogRow};
use crate::simulation::config::Config;
use crate::simulation::engines::EnergyEngine;
use crate::simulation::error::SimResult;
use crate::simulation::parking::{FacilityParkingCost, ParkingCostModel};
use crate::simulation::vehicles::engine_log::{EngineEnergyLog, NoEngineLog};
use crate::simulation::vehicles::garage::Garage;
use crate::simulation::vehicles::VehicleType;

/// Everything the energy core needs for one run. The charging log is created here and lives until
/// [`EnergyScenario::finish`].
#[derive(Debug)]
pub struct EnergyScenario {
    pub garage: Garage,
    pub parking: Arc<dyn ParkingCostModel>,
    pub charging_log: Arc<ChargingLog>,
    pub config: Arc<Config>,
}

impl EnergyScenario {
    pub fn from_config(config: Arc<Config>) -> SimResult<Self> {
        Self::with_engine_log(config, Arc::new(NoEngineLog))
    }

    /// Like [`EnergyScenario::from_config`], but every vehicle reports its engine usage to
    /// `engine_log`.
    pub fn with_engine_log(
        config: Arc<Config>,
        engine_log: Arc<dyn EngineEnergyLog>,
    ) -> SimResult<Self> {
        info!("Start loading energy scenario.");

        let mut garage = Garage::new().with_engine_log(engine_log);
        for definition in &config.energy().vehicle_types {
            garage.add_veh_type(VehicleType::from_definition(definition))?;
        }
        let parking = FacilityParkingCost::from_config(&config.parking())?;

        info!(
            "Loaded {} vehicle types and {} facility tariffs.",
            garage.vehicle_types.len(),
            parking.num_tariffs()
        );

        Ok(EnergyScenario {
            garage,
            parking: Arc::new(parking),
            charging_log: Arc::new(ChargingLog::new()),
            config,
        })
    }

    /// Engine for one agent thread.
    pub fn engine(&self) -> EnergyEngine {
        EnergyEngine::new(self.parking.clone(), self.charging_log.clone())
    }

    /// Ends the run and returns all charging sessions in the order they were recorded. If engines
    /// of this run are still alive, the rows are copied out of the shared log.
    pub fn finish(self) -> Vec<ChargingLogRow> {
        let rows = match Arc::try_unwrap(self.charging_log) {
            Ok(log) => log.into_rows(),
            Err(shared) => shared.rows(),
        };
        let total: f64 = rows.iter().map(ChargingLogRow::energy_joules).sum();
        info!(
            "Finished energy scenario. {} charging sessions, {total} J charged.",
            rows.len()
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::simulation::config::{
        Config, DrivetrainDefinition, Energy, FacilityTariff, Parking, VehicleTypeDefinition,
    };
    use crate::simulation::energy::{ConstantRateModel, LinkTraversal};
    use crate::simulation::error::EnergyError;
    use crate::simulation::id::Id;
    use crate::simulation::parking::{FlatRateParkingCost, FreeParking};
    use crate::simulation::scenario::EnergyScenario;

    fn config(type_id: &str) -> Config {
        let mut config = Config::default();
        config.set_energy(Energy {
            vehicle_types: vec![VehicleTypeDefinition {
                id: type_id.to_string(),
                drivetrain: DrivetrainDefinition::Electric {
                    battery_capacity_joules: 100_000.,
                    electric_model: Box::new(ConstantRateModel::new(100.).unwrap()),
                },
            }],
        });
        config.set_parking(Parking {
            default_model: Box::new(FreeParking::default()),
            facilities: vec![FacilityTariff {
                facility: String::from("scenario-paid"),
                model: Box::new(FlatRateParkingCost::new(1.).unwrap()),
            }],
        });
        config
    }

    #[test]
    fn run_lifecycle() {
        let mut scenario =
            EnergyScenario::from_config(Arc::new(config("scenario-run_lifecycle-ev"))).unwrap();
        let type_id = Id::get_from_ext("scenario-run_lifecycle-ev");
        let veh_id = scenario
            .garage
            .add_veh_by_type(&Id::create("scenario-run_lifecycle"), &type_id)
            .unwrap();

        let engine = scenario.engine();
        let mut vehicle = scenario.garage.unpark_veh(&veh_id).unwrap();
        engine
            .on_leg(&mut vehicle, &LinkTraversal::new(100., 10.))
            .unwrap();
        engine
            .on_charging(&mut vehicle, &Id::create("scenario-l1"), 10., 10., 500.)
            .unwrap();
        scenario.garage.park_veh(vehicle);

        let person = Id::create("scenario-run_lifecycle");
        assert_eq!(
            1.,
            engine
                .on_parking(0., 3600., &person, &Id::create("scenario-paid"))
                .unwrap()
        );
        assert_eq!(
            0.,
            engine
                .on_parking(0., 3600., &person, &Id::create("scenario-free"))
                .unwrap()
        );

        drop(engine);
        let rows = scenario.finish();
        assert_eq!(1, rows.len());
        assert_eq!(5000., rows[0].energy_joules());
    }

    #[test]
    fn finish_with_live_engine() {
        let scenario =
            EnergyScenario::from_config(Arc::new(config("scenario-finish_with_live_engine-ev")))
                .unwrap();
        let engine = scenario.engine();
        engine
            .on_charging_session(
                &Id::create("scenario-finish_with_live_engine"),
                &Id::create("scenario-l1"),
                0.,
                1.,
                42.,
            )
            .unwrap();

        let rows = scenario.finish();
        assert_eq!(1, rows.len());
        assert_eq!(1, engine.charging_log().len());
    }

    #[test]
    fn duplicate_vehicle_types_fail() {
        let config = config("scenario-duplicate_vehicle_types_fail-ev");
        let mut energy = config.energy();
        energy.vehicle_types.push(energy.vehicle_types[0].clone());
        let mut config = config;
        config.set_energy(energy);

        let result = EnergyScenario::from_config(Arc::new(config));
        assert!(matches!(result, Err(EnergyError::DuplicateVehicleType(_))));
    }
}
