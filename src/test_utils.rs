use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::simulation::energy::ConstantRateModel;
use crate::simulation::id::Id;
use crate::simulation::vehicles::battery::Battery;
use crate::simulation::vehicles::combustion::CombustionDrivetrain;
use crate::simulation::vehicles::electric::ElectricDrivetrain;
use crate::simulation::vehicles::engine_log::EngineEnergyLog;
use crate::simulation::vehicles::hybrid::{HybridDrivetrain, HybridPolicy};
use crate::simulation::vehicles::{Drivetrain, Vehicle};

/// Fully charged battery electric vehicle with a constant consumption.
pub fn create_electric_vehicle(id: &str, capacity_joules: f64, joules_per_meter: f64) -> Vehicle {
    let drivetrain = ElectricDrivetrain::new(
        Arc::new(ConstantRateModel::new(joules_per_meter).unwrap()),
        Battery::new(capacity_joules).unwrap(),
    );
    Vehicle::new(
        Id::create(id),
        Id::create("test-bev"),
        Drivetrain::Electric(drivetrain),
    )
}

pub fn create_combustion_vehicle(
    id: &str,
    joules_per_meter: f64,
    engine_log: Arc<dyn EngineEnergyLog>,
) -> Vehicle {
    let drivetrain = CombustionDrivetrain::new(
        Arc::new(ConstantRateModel::new(joules_per_meter).unwrap()),
        engine_log,
    );
    Vehicle::new(
        Id::create(id),
        Id::create("test-icev"),
        Drivetrain::Combustion(drivetrain),
    )
}

/// Fully charged plug-in hybrid. It uses 100 J/m electrically and 300 J/m on its engine.
pub fn create_hybrid_vehicle(
    id: &str,
    capacity_joules: f64,
    policy: HybridPolicy,
    engine_log: Arc<dyn EngineEnergyLog>,
) -> Vehicle {
    let drivetrain = HybridDrivetrain::new(
        Arc::new(ConstantRateModel::new(100.).unwrap()),
        Arc::new(ConstantRateModel::new(300.).unwrap()),
        Battery::new(capacity_joules).unwrap(),
    )
    .with_policy(policy)
    .with_engine_log(engine_log);
    Vehicle::new(
        Id::create(id),
        Id::create("test-phev"),
        Drivetrain::Hybrid(drivetrain),
    )
}

pub fn create_folders(path: PathBuf) -> PathBuf {
    fs::create_dir_all(&path)
        .unwrap_or_else(|_e| panic!("Failed to create folders for path {path:?}"));
    path
}
