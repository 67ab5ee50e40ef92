pub mod charging;
pub mod config;
pub mod energy;
pub mod engines;
pub mod error;
pub mod id;
pub mod identities;
pub mod logging;
pub mod parking;
pub mod scenario;
pub mod vehicles;
