use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::simulation::energy::EnergyConsumptionModel;
use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::parking::{FreeParking, ParkingCostModel};
use crate::simulation::vehicles::hybrid::HybridPolicy;

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Config {
    // a Mutex so that the config can be shared between threads
    modules: Mutex<HashMap<String, Box<dyn ConfigModule>>>,
    #[serde(skip)]
    context: Option<PathBuf>,
}

impl Config {
    pub fn from_file(config_path: &Path) -> SimResult<Self> {
        let reader = BufReader::new(File::open(config_path)?);
        let mut config: Config =
            serde_yaml::from_reader(reader).map_err(|source| EnergyError::ConfigParse {
                path: config_path.to_path_buf(),
                source,
            })?;
        config.context = Some(config_path.to_path_buf());
        info!("Loaded config from {config_path:?}");
        Ok(config)
    }

    /// Path of the file this config was read from.
    pub fn context(&self) -> &Option<PathBuf> {
        &self.context
    }

    /// Output directory. Relative paths are resolved against the directory of the config file.
    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.context, &self.output().output_dir)
    }

    pub fn output(&self) -> Output {
        self.module_or_default("output", Output::default)
    }

    pub fn set_output(&mut self, output: Output) {
        self.modules().insert("output".to_string(), Box::new(output));
    }

    pub fn energy(&self) -> Energy {
        self.module_or_default("energy", Energy::default)
    }

    pub fn set_energy(&mut self, energy: Energy) {
        self.modules().insert("energy".to_string(), Box::new(energy));
    }

    pub fn parking(&self) -> Parking {
        self.module_or_default("parking", Parking::default)
    }

    pub fn set_parking(&mut self, parking: Parking) {
        self.modules().insert("parking".to_string(), Box::new(parking));
    }

    fn modules(&self) -> MutexGuard<'_, HashMap<String, Box<dyn ConfigModule>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn module<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.modules()
            .get(key)
            .and_then(|boxed| boxed.as_ref().as_any().downcast_ref::<T>())
            .cloned()
    }

    /// Returns the module stored under `key`. If there is none, the default is stored and returned,
    /// so that a written config shows every setting which was used.
    fn module_or_default<T>(&self, key: &str, default: impl FnOnce() -> T) -> T
    where
        T: ConfigModule + Clone + 'static,
    {
        if let Some(module) = self.module::<T>(key) {
            return module;
        }
        let module = default();
        self.modules()
            .insert(key.to_string(), Box::new(module.clone()));
        module
    }
}

pub fn resolve_path(config_path: &Option<PathBuf>, file_path: &Path) -> PathBuf {
    if file_path.is_absolute() || file_path.starts_with("./") {
        return file_path.to_path_buf();
    }
    match config_path.as_ref().and_then(|c| c.parent()) {
        Some(dir) => dir.join(file_path),
        None => file_path.to_path_buf(),
    }
}

pub fn write_config(config: &Config, output_path: &Path) -> SimResult<PathBuf> {
    let output_config = output_path.join("output_config.yml");
    let writer = BufWriter::new(File::create(&output_config)?);
    serde_yaml::to_writer(writer, config).map_err(|source| EnergyError::ConfigParse {
        path: output_config.clone(),
        source,
    })?;
    Ok(output_config)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Output {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            output_dir: PathBuf::from("./"),
            logging: Logging::None,
        }
    }
}

/// Log level of the file log. tracing has no level for "off" which could be parsed from the config,
/// hence this enum.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum Logging {
    #[default]
    None,
    Info,
}

/// Vehicle types of a run.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Energy {
    #[serde(default)]
    pub vehicle_types: Vec<VehicleTypeDefinition>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VehicleTypeDefinition {
    pub id: String,
    pub drivetrain: DrivetrainDefinition,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "class")]
pub enum DrivetrainDefinition {
    Electric {
        battery_capacity_joules: f64,
        electric_model: Box<dyn EnergyConsumptionModel>,
    },
    Combustion {
        engine_model: Box<dyn EnergyConsumptionModel>,
    },
    Hybrid {
        battery_capacity_joules: f64,
        electric_model: Box<dyn EnergyConsumptionModel>,
        engine_model: Box<dyn EnergyConsumptionModel>,
        /// Model used for the part of a leg driven in hybrid mode. Defaults to the electric model.
        #[serde(default)]
        hybrid_model: Option<Box<dyn EnergyConsumptionModel>>,
        #[serde(default)]
        policy: HybridPolicy,
    },
}

/// Parking tariffs. Facilities listed in `facilities` use their own tariff, all others the default.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Parking {
    pub default_model: Box<dyn ParkingCostModel>,
    #[serde(default)]
    pub facilities: Vec<FacilityTariff>,
}

impl Default for Parking {
    fn default() -> Self {
        Parking {
            default_model: Box::new(FreeParking::default()),
            facilities: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FacilityTariff {
    pub facility: String,
    pub model: Box<dyn ParkingCostModel>,
}

#[typetag::serde(tag = "type")]
pub trait ConfigModule: Debug + Send + DynClone {
    fn as_any(&self) -> &dyn Any;
}

#[typetag::serde]
impl ConfigModule for Output {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[typetag::serde]
impl ConfigModule for Energy {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[typetag::serde]
impl ConfigModule for Parking {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

dyn_clone::clone_trait_object!(ConfigModule);
