use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use assert_approx_eq::assert_approx_eq;
use macros::integration_test;
use rust_qsim_energy::simulation::config::{write_config, Config, Logging};
use rust_qsim_energy::simulation::energy::LinkTraversal;
use rust_qsim_energy::simulation::error::EnergyError;
use rust_qsim_energy::simulation::id::Id;
use rust_qsim_energy::simulation::scenario::EnergyScenario;
use rust_qsim_energy::simulation::vehicles::engine_log::EngineEnergyCollector;
use rust_qsim_energy::simulation::vehicles::{
    DrivetrainClass, DrivetrainMode, Vehicle, VehicleType,
};
use rust_qsim_energy::test_utils::create_folders;

const CONFIG: &str = "./tests/resources/energy_config.yml";

fn load_scenario() -> EnergyScenario {
    let config = Config::from_file(&PathBuf::from(CONFIG)).unwrap();
    EnergyScenario::from_config(Arc::new(config)).unwrap()
}

fn take_vehicle(scenario: &mut EnergyScenario, person: &str, vehicle_type: &str) -> Vehicle {
    let veh_id = scenario
        .garage
        .add_veh_by_type(&Id::create(person), &Id::get_from_ext(vehicle_type))
        .unwrap();
    scenario.garage.unpark_veh(&veh_id).unwrap()
}

#[integration_test(rust_qsim_energy)]
fn load_config_fixture() {
    let scenario = load_scenario();
    assert_eq!(5, scenario.garage.vehicle_types.len());
    assert_eq!(5, Id::<VehicleType>::count());
    assert_eq!(Logging::None, scenario.config.output().logging);

    let phev = scenario
        .garage
        .vehicle_type(&Id::get_from_ext("phev"))
        .unwrap();
    assert_eq!(DrivetrainClass::HybridElectric, phev.class());
}

#[integration_test(rust_qsim_energy)]
fn electric_leg_within_charge() {
    let mut scenario = load_scenario();
    let engine = scenario.engine();
    let mut vehicle = take_vehicle(&mut scenario, "alice", "bev");

    // 300 m at 100 J/m
    let result = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(300., 30.))
        .unwrap();

    assert_eq!(30_000., result.joules_consumed);
    assert_eq!(Some(70_000.), vehicle.soc());
    assert!(!result.insufficient_charge);
}

#[integration_test(rust_qsim_energy)]
fn hybrid_depletes_and_switches_to_engine() {
    let collector = Arc::new(EngineEnergyCollector::new());
    let config = Config::from_file(&PathBuf::from(CONFIG)).unwrap();
    let mut scenario =
        EnergyScenario::with_engine_log(Arc::new(config), collector.clone()).unwrap();
    let engine = scenario.engine();
    let mut vehicle = take_vehicle(&mut scenario, "bob", "phev");

    assert_eq!(DrivetrainMode::Electric, vehicle.current_mode());
    let first = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(900., 90.))
        .unwrap();
    assert_eq!(DrivetrainMode::Electric, first.mode);
    assert_eq!(Some(10_000.), vehicle.soc());

    // needs 30_000 J electrically, which the battery can't provide
    let second = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(300., 30.))
        .unwrap();
    assert_eq!(DrivetrainMode::Engine, second.mode);
    assert_eq!(90_000., second.engine_joules);
    assert_eq!(Some(10_000.), vehicle.soc());

    let third = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(50., 5.))
        .unwrap();
    assert_eq!(DrivetrainMode::Electric, third.mode);
    assert_eq!(Some(5_000.), vehicle.soc());

    assert_eq!(1, collector.usage(vehicle.id()).legs);
    assert_eq!(90_000., collector.total_joules());
}

#[integration_test(rust_qsim_energy)]
fn charge_depleting_hybrid_blends() {
    let mut scenario = load_scenario();
    let engine = scenario.engine();
    let mut vehicle = take_vehicle(&mut scenario, "carol", "phev_blended");

    // 150_000 J electrically, the battery covers two thirds of the leg
    let result = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(1500., 150.))
        .unwrap();

    assert!(result.insufficient_charge);
    assert_eq!(DrivetrainMode::Engine, result.mode);
    assert_approx_eq!(100_000., result.battery_joules);
    // remaining 500 m on the hybrid-mode model with 200 J/m
    assert_approx_eq!(100_000., result.engine_joules, 1e-6);
    assert_eq!(Some(0.), vehicle.soc());

    let next = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(10., 1.))
        .unwrap();
    // an empty battery can't provide anything, the whole leg runs on the hybrid-mode model
    assert_eq!(DrivetrainMode::Engine, next.mode);
    assert!(next.insufficient_charge);
    assert_eq!(0., next.battery_joules);
    assert_approx_eq!(2_000., next.engine_joules);
}

#[integration_test(rust_qsim_energy)]
fn grade_and_speed_aware_vehicle() {
    let mut scenario = load_scenario();
    let engine = scenario.engine();
    let mut vehicle = take_vehicle(&mut scenario, "dave", "bev_city");

    // 15 m/s on the flat uses 500 J/m
    let flat = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(1000., 1000. / 15.))
        .unwrap();
    assert_approx_eq!(500_000., flat.joules_consumed, 1e-6);

    let uphill = engine
        .on_leg(
            &mut vehicle,
            &LinkTraversal::new(1000., 1000. / 15.).with_grade(0.05),
        )
        .unwrap();
    let downhill = engine
        .on_leg(
            &mut vehicle,
            &LinkTraversal::new(1000., 1000. / 15.).with_grade(-0.05),
        )
        .unwrap();
    assert!(uphill.joules_consumed > flat.joules_consumed);
    assert!(downhill.joules_consumed < flat.joules_consumed);
    assert!(downhill.joules_consumed >= 0.);
}

#[integration_test(rust_qsim_energy)]
fn combustion_vehicle_is_not_chargeable() {
    let mut scenario = load_scenario();
    let engine = scenario.engine();
    let mut vehicle = take_vehicle(&mut scenario, "erin", "icev");

    let result = engine
        .on_leg(&mut vehicle, &LinkTraversal::new(100., 10.))
        .unwrap();
    assert_eq!(250_000., result.engine_joules);
    assert_eq!(None, result.soc_joules);

    let charging = engine.on_charging(&mut vehicle, &Id::create("l1"), 0., 600., 11_000.);
    assert!(matches!(charging, Err(EnergyError::NotChargeable(_))));
    assert!(engine.charging_log().is_empty());
}

#[integration_test(rust_qsim_energy)]
fn parking_tariffs_by_facility() {
    let scenario = load_scenario();
    let engine = scenario.engine();
    let person = Id::create("frank");

    let cost = |facility: &str, arrival_h: f64, duration_h: f64| {
        engine
            .on_parking(
                arrival_h * 3600.,
                duration_h * 3600.,
                &person,
                &Id::create(facility),
            )
            .unwrap()
    };

    // 07:00 to 09:00: one hour at 0.5, one hour at 2
    assert_approx_eq!(2.5, cost("downtown_garage", 7., 2.));
    assert_approx_eq!(3., cost("airport", 10., 0.5));
    assert_approx_eq!(8., cost("airport", 10., 3.));
    assert_approx_eq!(11., cost("airport", 10., 6.));
    assert_approx_eq!(20., cost("airport", 10., 20.));
    assert_approx_eq!(0.8 + 1.2 * 2., cost("station", 10., 2.));
    assert_eq!(0., cost("somewhere_else", 10., 2.));
}

#[integration_test(rust_qsim_energy)]
fn charging_sessions_from_many_threads() {
    let mut scenario = load_scenario();
    let vehicles: Vec<Vehicle> = (0..4)
        .map(|i| take_vehicle(&mut scenario, &format!("driver_{i}"), "bev"))
        .collect();

    let handles: Vec<_> = vehicles
        .into_iter()
        .map(|mut vehicle| {
            let engine = scenario.engine();
            thread::spawn(move || {
                let link = Id::create("charger_link");
                for i in 0..10 {
                    engine
                        .on_leg(&mut vehicle, &LinkTraversal::new(100., 10.))
                        .unwrap();
                    engine
                        .on_charging(&mut vehicle, &link, i as f64 * 60., 60., 1000.)
                        .unwrap();
                }
                vehicle
            })
        })
        .collect();

    for handle in handles {
        let vehicle = handle.join().unwrap();
        // each leg takes 10_000 J, each session refills it
        assert_eq!(Some(100_000.), vehicle.soc());
        scenario.garage.park_veh(vehicle);
    }

    let rows = scenario.finish();
    assert_eq!(40, rows.len());
    let total: f64 = rows.iter().map(|r| r.energy_joules()).sum();
    assert_eq!(400_000., total);
}

#[integration_test(rust_qsim_energy)]
fn record_host_measured_session() {
    let scenario = load_scenario();
    let engine = scenario.engine();

    let row = engine
        .on_charging_session(&Id::create("v1"), &Id::create("l42"), 3600., 900., 5_000_000.)
        .unwrap();
    assert_eq!(5_000_000., row.energy_joules());
    assert_eq!("l42", row.link().external());

    let invalid = engine.on_charging_session(&Id::create("v1"), &Id::create("l42"), 3600., -1., 1.);
    assert!(matches!(invalid, Err(EnergyError::InvalidChargingRecord(_))));

    drop(engine);
    assert_eq!(1, scenario.finish().len());
}

#[integration_test(rust_qsim_energy)]
fn write_and_reload_config() {
    let config = Config::from_file(&PathBuf::from(CONFIG)).unwrap();
    let out_dir = create_folders(PathBuf::from("./test_output/energy/write_and_reload_config"));

    let written = write_config(&config, &out_dir).unwrap();
    let reloaded = Config::from_file(&written).unwrap();

    assert_eq!(5, reloaded.energy().vehicle_types.len());
    assert_eq!(3, reloaded.parking().facilities.len());
    let scenario = EnergyScenario::from_config(Arc::new(reloaded)).unwrap();
    assert_eq!(5, scenario.garage.vehicle_types.len());
}
