use crate::simulation::energy::check_parameter;
use crate::simulation::error::{EnergyError, SimResult};

/// Usable battery capacity and state of charge, both in joules. The state of charge always stays
/// within `0..=capacity`. Discharging more than is stored empties the battery, charging more than
/// fits fills it up. Both operations report how much energy actually moved.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    capacity_joules: f64,
    soc_joules: f64,
}

impl Battery {
    /// A fully charged battery.
    pub fn new(capacity_joules: f64) -> SimResult<Self> {
        Self::with_soc(capacity_joules, capacity_joules)
    }

    pub fn with_soc(capacity_joules: f64, soc_joules: f64) -> SimResult<Self> {
        check_parameter("battery capacity", capacity_joules)?;
        if !soc_joules.is_finite() || soc_joules < 0. || soc_joules > capacity_joules {
            return Err(EnergyError::InvalidConfig(format!(
                "state of charge must be within [0, {capacity_joules}], was {soc_joules}"
            )));
        }
        Ok(Battery {
            capacity_joules,
            soc_joules,
        })
    }

    pub fn capacity(&self) -> f64 {
        self.capacity_joules
    }

    pub fn soc(&self) -> f64 {
        self.soc_joules
    }

    pub fn soc_fraction(&self) -> f64 {
        if self.capacity_joules > 0. {
            self.soc_joules / self.capacity_joules
        } else {
            0.
        }
    }

    pub fn is_empty(&self) -> bool {
        self.soc_joules <= 0.
    }

    /// Energy which can still be charged into the battery.
    pub fn headroom(&self) -> f64 {
        self.capacity_joules - self.soc_joules
    }

    pub fn can_supply(&self, joules: f64) -> bool {
        joules <= self.soc_joules
    }

    /// Draws `joules` from the battery and returns the amount actually drawn.
    pub fn discharge(&mut self, joules: f64) -> f64 {
        if joules > self.soc_joules {
            let drawn = self.soc_joules;
            self.soc_joules = 0.;
            drawn
        } else {
            self.soc_joules -= joules;
            joules
        }
    }

    /// Stores up to `joules` in the battery and returns the amount actually stored.
    pub fn charge(&mut self, joules: f64) -> f64 {
        let accepted = joules.min(self.headroom()).max(0.);
        self.soc_joules = (self.soc_joules + accepted).min(self.capacity_joules);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use crate::simulation::error::EnergyError;
    use crate::simulation::vehicles::battery::Battery;

    #[test]
    fn new_is_full() {
        let battery = Battery::new(100_000.).unwrap();
        assert_eq!(100_000., battery.soc());
        assert_eq!(1., battery.soc_fraction());
        assert_eq!(0., battery.headroom());
    }

    #[test]
    fn discharge_within_soc() {
        let mut battery = Battery::new(100_000.).unwrap();
        assert_eq!(30_000., battery.discharge(30_000.));
        assert_eq!(70_000., battery.soc());
    }

    #[test]
    fn discharge_exact_soc_empties() {
        let mut battery = Battery::with_soc(100_000., 30_000.).unwrap();
        assert_eq!(30_000., battery.discharge(30_000.));
        assert!(battery.is_empty());
    }

    #[test]
    fn discharge_beyond_soc_clamps() {
        let mut battery = Battery::with_soc(100_000., 10_000.).unwrap();
        assert_eq!(10_000., battery.discharge(30_000.));
        assert_eq!(0., battery.soc());
    }

    #[test]
    fn charge_clamps_to_capacity() {
        let mut battery = Battery::with_soc(100_000., 90_000.).unwrap();
        assert_eq!(10_000., battery.charge(50_000.));
        assert_eq!(100_000., battery.soc());
        assert_eq!(0., battery.charge(1.));
    }

    #[test]
    fn reject_soc_outside_capacity() {
        assert!(matches!(
            Battery::with_soc(100., 101.),
            Err(EnergyError::InvalidConfig(_))
        ));
        assert!(matches!(
            Battery::with_soc(100., -1.),
            Err(EnergyError::InvalidConfig(_))
        ));
        assert!(matches!(
            Battery::new(f64::NAN),
            Err(EnergyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_capacity() {
        let battery = Battery::new(0.).unwrap();
        assert!(battery.is_empty());
        assert_eq!(0., battery.soc_fraction());
    }
}
