use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::simulation::energy::{EnergyConsumptionModel, LinkTraversal};
use crate::simulation::error::SimResult;
use crate::simulation::id::Id;
use crate::simulation::vehicles::battery::Battery;
use crate::simulation::vehicles::engine_log::{EngineEnergyLog, NoEngineLog};
use crate::simulation::vehicles::{DrivetrainMode, EnergyResult, Vehicle};

/// How a hybrid covers a leg which its battery can't cover on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HybridPolicy {
    /// Drive the whole leg on the engine model. The battery is not asked for any energy and is
    /// left untouched.
    SwitchPerLeg,
    /// Drive electrically until the battery is empty and cover the rest of the leg with the
    /// hybrid-mode model. The leg is flagged with `insufficient_charge`.
    #[default]
    ChargeDepleting,
}

/// Plug-in hybrid drivetrain with an electric motor and a combustion engine.
///
/// The drive mode is re-evaluated at the start of every leg: the electric motor is used whenever
/// the battery holds enough energy for the whole leg according to the electric model, otherwise
/// the engine takes over. There is no hysteresis. Every leg driven in engine mode is reported to
/// the [`EngineEnergyLog`] exactly once.
///
/// Unless configured otherwise, the hybrid-mode model is the electric model instance.
#[derive(Debug, Clone)]
pub struct HybridDrivetrain {
    pub(super) battery: Battery,
    electric_model: Arc<dyn EnergyConsumptionModel>,
    engine_model: Arc<dyn EnergyConsumptionModel>,
    hybrid_model: Arc<dyn EnergyConsumptionModel>,
    policy: HybridPolicy,
    engine_log: Arc<dyn EngineEnergyLog>,
    mode: DrivetrainMode,
}

impl HybridDrivetrain {
    pub fn new(
        electric_model: Arc<dyn EnergyConsumptionModel>,
        engine_model: Arc<dyn EnergyConsumptionModel>,
        battery: Battery,
    ) -> Self {
        let mode = if battery.is_empty() {
            DrivetrainMode::Engine
        } else {
            DrivetrainMode::Electric
        };
        HybridDrivetrain {
            battery,
            hybrid_model: electric_model.clone(),
            electric_model,
            engine_model,
            policy: HybridPolicy::default(),
            engine_log: Arc::new(NoEngineLog),
            mode,
        }
    }

    pub fn with_hybrid_model(mut self, hybrid_model: Arc<dyn EnergyConsumptionModel>) -> Self {
        self.hybrid_model = hybrid_model;
        self
    }

    pub fn with_policy(mut self, policy: HybridPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_engine_log(mut self, engine_log: Arc<dyn EngineEnergyLog>) -> Self {
        self.engine_log = engine_log;
        self
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn policy(&self) -> HybridPolicy {
        self.policy
    }

    /// The mode of the most recent leg, or the initial mode if no leg was driven yet.
    pub fn mode(&self) -> DrivetrainMode {
        self.mode
    }

    pub fn electric_model(&self) -> &Arc<dyn EnergyConsumptionModel> {
        &self.electric_model
    }

    pub fn engine_model(&self) -> &Arc<dyn EnergyConsumptionModel> {
        &self.engine_model
    }

    pub fn hybrid_model(&self) -> &Arc<dyn EnergyConsumptionModel> {
        &self.hybrid_model
    }

    pub fn select_drivetrain_mode(&self, traversal: &LinkTraversal) -> SimResult<DrivetrainMode> {
        let electric_demand = self.electric_model.consume_energy(traversal)?;
        Ok(self.mode_for(electric_demand))
    }

    fn mode_for(&self, electric_demand: f64) -> DrivetrainMode {
        if !self.battery.is_empty() && self.battery.can_supply(electric_demand) {
            DrivetrainMode::Electric
        } else {
            DrivetrainMode::Engine
        }
    }

    pub(super) fn apply(
        &mut self,
        vehicle: &Id<Vehicle>,
        traversal: &LinkTraversal,
    ) -> SimResult<EnergyResult> {
        let electric_demand = self.electric_model.consume_energy(traversal)?;
        let mode = self.mode_for(electric_demand);

        let result = match mode {
            DrivetrainMode::Electric => {
                let drawn = self.battery.discharge(electric_demand);
                EnergyResult {
                    joules_consumed: drawn,
                    battery_joules: drawn,
                    engine_joules: 0.,
                    soc_joules: Some(self.battery.soc()),
                    insufficient_charge: false,
                    mode,
                }
            }
            DrivetrainMode::Engine => self.apply_engine(vehicle, traversal, electric_demand)?,
        };

        if self.mode != mode {
            trace!(vehicle = %vehicle, from = ?self.mode, to = ?mode, "hybrid switched drive mode");
        }
        self.mode = mode;
        Ok(result)
    }

    fn apply_engine(
        &mut self,
        vehicle: &Id<Vehicle>,
        traversal: &LinkTraversal,
        electric_demand: f64,
    ) -> SimResult<EnergyResult> {
        let soc = self.battery.soc();
        let result = match self.policy {
            HybridPolicy::SwitchPerLeg => {
                let engine_joules = self.engine_model.consume_energy(traversal)?;
                EnergyResult {
                    joules_consumed: engine_joules,
                    battery_joules: 0.,
                    engine_joules,
                    soc_joules: Some(soc),
                    insufficient_charge: false,
                    mode: DrivetrainMode::Engine,
                }
            }
            HybridPolicy::ChargeDepleting => {
                // share of the leg the remaining charge can cover electrically
                let electric_share = if electric_demand > 0. {
                    (soc / electric_demand).min(1.)
                } else {
                    0.
                };
                let remaining = traversal.scaled(1. - electric_share);
                let engine_joules = self.hybrid_model.consume_energy(&remaining)?;
                let drawn = self.battery.discharge(soc);
                EnergyResult {
                    joules_consumed: drawn + engine_joules,
                    battery_joules: drawn,
                    engine_joules,
                    soc_joules: Some(self.battery.soc()),
                    insufficient_charge: electric_demand > soc,
                    mode: DrivetrainMode::Engine,
                }
            }
        };

        self.engine_log
            .record_engine_energy_consumption(vehicle, result.engine_joules);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_approx_eq::assert_approx_eq;

    use crate::simulation::energy::{ConstantRateModel, LinkTraversal};
    use crate::simulation::id::Id;
    use crate::simulation::vehicles::battery::Battery;
    use crate::simulation::vehicles::engine_log::EngineEnergyCollector;
    use crate::simulation::vehicles::hybrid::{HybridDrivetrain, HybridPolicy};
    use crate::simulation::vehicles::DrivetrainMode;

    // electric: 100 J/m, engine: 300 J/m
    fn drivetrain(soc: f64, collector: Arc<EngineEnergyCollector>) -> HybridDrivetrain {
        HybridDrivetrain::new(
            Arc::new(ConstantRateModel::new(100.).unwrap()),
            Arc::new(ConstantRateModel::new(300.).unwrap()),
            Battery::with_soc(100_000., soc).unwrap(),
        )
        .with_engine_log(collector)
    }

    #[test]
    fn initial_mode_depends_on_charge() {
        let full = drivetrain(100_000., Arc::default());
        assert_eq!(DrivetrainMode::Electric, full.mode());
        let empty = drivetrain(0., Arc::default());
        assert_eq!(DrivetrainMode::Engine, empty.mode());
    }

    #[test]
    fn defaults_to_charge_depleting_with_electric_model() {
        let hybrid = drivetrain(100_000., Arc::default());
        assert_eq!(HybridPolicy::ChargeDepleting, hybrid.policy());
        assert!(Arc::ptr_eq(hybrid.electric_model(), hybrid.hybrid_model()));
    }

    #[test]
    fn default_hybrid_runs_out_of_charge() {
        let id = Id::create("default_hybrid_runs_out_of_charge");
        let mut hybrid = drivetrain(10_000., Arc::default());

        // 30_000 J electric demand
        let result = hybrid.apply(&id, &LinkTraversal::new(300., 60.)).unwrap();

        assert!(result.insufficient_charge);
        assert_approx_eq!(30_000., result.joules_consumed, 1e-6);
        assert_eq!(10_000., result.battery_joules);
        assert_eq!(Some(0.), result.soc_joules);
        let next = hybrid
            .select_drivetrain_mode(&LinkTraversal::new(300., 60.))
            .unwrap();
        assert_eq!(DrivetrainMode::Engine, next);
    }

    #[test]
    fn charge_depleting_flags_empty_battery() {
        let id = Id::create("charge_depleting_flags_empty_battery");
        let mut hybrid = drivetrain(0., Arc::default());

        let result = hybrid.apply(&id, &LinkTraversal::new(10., 1.)).unwrap();
        assert!(result.insufficient_charge);
        assert_eq!(0., result.battery_joules);
        assert_approx_eq!(1_000., result.engine_joules);

        let standing = hybrid.apply(&id, &LinkTraversal::new(0., 1.)).unwrap();
        assert!(!standing.insufficient_charge);
    }

    #[test]
    fn select_electric_when_charge_suffices() {
        let hybrid = drivetrain(100_000., Arc::default());
        let mode = hybrid
            .select_drivetrain_mode(&LinkTraversal::new(1000., 60.))
            .unwrap();
        assert_eq!(DrivetrainMode::Electric, mode);
    }

    #[test]
    fn select_engine_when_empty() {
        let hybrid = drivetrain(0., Arc::default());
        for length in [0., 1., 1000.] {
            let mode = hybrid
                .select_drivetrain_mode(&LinkTraversal::new(length, 60.))
                .unwrap();
            assert_eq!(DrivetrainMode::Engine, mode);
        }
    }

    #[test]
    fn select_engine_when_charge_too_low() {
        let hybrid = drivetrain(10_000., Arc::default());
        let mode = hybrid
            .select_drivetrain_mode(&LinkTraversal::new(300., 60.))
            .unwrap();
        assert_eq!(DrivetrainMode::Engine, mode);
    }

    #[test]
    fn electric_leg_does_not_call_engine_log() {
        let collector = Arc::new(EngineEnergyCollector::new());
        let id = Id::create("electric_leg_does_not_call_engine_log");
        let mut hybrid = drivetrain(100_000., collector.clone());

        let result = hybrid.apply(&id, &LinkTraversal::new(300., 60.)).unwrap();

        assert_eq!(DrivetrainMode::Electric, result.mode);
        assert_eq!(30_000., result.joules_consumed);
        assert_eq!(Some(70_000.), result.soc_joules);
        assert_eq!(0, collector.usage(&id).legs);
    }

    #[test]
    fn switch_per_leg_keeps_battery() {
        let collector = Arc::new(EngineEnergyCollector::new());
        let id = Id::create("switch_per_leg_keeps_battery");
        let mut hybrid =
            drivetrain(10_000., collector.clone()).with_policy(HybridPolicy::SwitchPerLeg);

        let result = hybrid.apply(&id, &LinkTraversal::new(300., 60.)).unwrap();

        assert_eq!(DrivetrainMode::Engine, result.mode);
        assert_eq!(90_000., result.engine_joules);
        assert_eq!(Some(10_000.), result.soc_joules);
        assert_eq!(0., result.battery_joules);
        assert!(!result.insufficient_charge);
        assert_eq!(10_000., hybrid.battery().soc());
        assert_eq!(1, collector.usage(&id).legs);
        assert_eq!(90_000., collector.usage(&id).joules);
    }

    #[test]
    fn charge_depleting_drains_battery_first() {
        let collector = Arc::new(EngineEnergyCollector::new());
        let id = Id::create("charge_depleting_drains_battery_first");
        let mut hybrid = drivetrain(10_000., collector.clone())
            .with_policy(HybridPolicy::ChargeDepleting)
            .with_hybrid_model(Arc::new(ConstantRateModel::new(200.).unwrap()));

        // electric demand is 30_000 J, the battery covers the first third of the link
        let result = hybrid.apply(&id, &LinkTraversal::new(300., 60.)).unwrap();

        assert_eq!(DrivetrainMode::Engine, result.mode);
        assert!(result.insufficient_charge);
        assert_eq!(10_000., result.battery_joules);
        assert_approx_eq!(40_000., result.engine_joules, 1e-6);
        assert_eq!(Some(0.), result.soc_joules);
        assert_eq!(1, collector.usage(&id).legs);

        let next = hybrid
            .select_drivetrain_mode(&LinkTraversal::new(1., 1.))
            .unwrap();
        assert_eq!(DrivetrainMode::Engine, next);
    }

    #[test]
    fn engine_log_called_once_per_engine_leg() {
        let collector = Arc::new(EngineEnergyCollector::new());
        let id = Id::create("engine_log_called_once_per_engine_leg");
        let mut hybrid =
            drivetrain(50_000., collector.clone()).with_policy(HybridPolicy::SwitchPerLeg);

        let mut engine_legs = 0;
        for _ in 0..10 {
            // 20_000 J electric demand per leg
            let result = hybrid.apply(&id, &LinkTraversal::new(200., 30.)).unwrap();
            if result.mode == DrivetrainMode::Engine {
                engine_legs += 1;
            }
        }

        // two electric legs drain 40_000 J, the remaining 10_000 J are not enough for a third
        assert_eq!(8, engine_legs);
        assert_eq!(engine_legs, collector.usage(&id).legs);
        assert_eq!(10_000., hybrid.battery().soc());
    }

    #[test]
    fn invalid_traversal_leaves_state_untouched() {
        let collector = Arc::new(EngineEnergyCollector::new());
        let id = Id::create("invalid_traversal_leaves_state_untouched");
        let mut hybrid = drivetrain(10_000., collector.clone())
            .with_policy(HybridPolicy::ChargeDepleting);

        assert!(hybrid.apply(&id, &LinkTraversal::new(-1., 1.)).is_err());
        assert_eq!(10_000., hybrid.battery().soc());
        assert_eq!(0, collector.usage(&id).legs);
    }
}
