use std::fmt::Debug;

use dashmap::DashMap;
use nohash_hasher::BuildNoHashHasher;

use crate::simulation::id::Id;
use crate::simulation::vehicles::Vehicle;

/// Receives the engine energy of every leg which was driven on a combustion engine. Implementors
/// must not feed anything back into the vehicle. This is a telemetry extension point only.
pub trait EngineEnergyLog: Debug + Send + Sync {
    fn record_engine_energy_consumption(&self, vehicle: &Id<Vehicle>, joules: f64);
}

/// The default log. It records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEngineLog;

impl EngineEnergyLog for NoEngineLog {
    fn record_engine_energy_consumption(&self, _vehicle: &Id<Vehicle>, _joules: f64) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EngineUsage {
    pub legs: usize,
    pub joules: f64,
}

/// Sums up engine usage per vehicle. Can be shared between agent threads.
#[derive(Debug)]
pub struct EngineEnergyCollector {
    usage: DashMap<Id<Vehicle>, EngineUsage, BuildNoHashHasher<Id<Vehicle>>>,
}

impl Default for EngineEnergyCollector {
    fn default() -> Self {
        EngineEnergyCollector::new()
    }
}

impl EngineEnergyCollector {
    pub fn new() -> Self {
        EngineEnergyCollector {
            usage: DashMap::with_hasher(BuildNoHashHasher::default()),
        }
    }

    pub fn usage(&self, vehicle: &Id<Vehicle>) -> EngineUsage {
        self.usage
            .get(vehicle)
            .map(|usage| *usage)
            .unwrap_or_default()
    }

    pub fn total_legs(&self) -> usize {
        self.usage.iter().map(|entry| entry.legs).sum()
    }

    pub fn total_joules(&self) -> f64 {
        self.usage.iter().map(|entry| entry.joules).sum()
    }
}

impl EngineEnergyLog for EngineEnergyCollector {
    fn record_engine_energy_consumption(&self, vehicle: &Id<Vehicle>, joules: f64) {
        let mut usage = self.usage.entry(vehicle.clone()).or_default();
        usage.legs += 1;
        usage.joules += joules;
    }
}
