pub mod energy_engine;

pub use energy_engine::EnergyEngine;
