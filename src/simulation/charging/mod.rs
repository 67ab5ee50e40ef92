use nohash_hasher::IntMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::identities::Link;
use crate::simulation::vehicles::Vehicle;

/// One completed charging session. Times are seconds, energy is joules.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingLogRow {
    vehicle: Id<Vehicle>,
    link: Id<Link>,
    start_time: f64,
    duration: f64,
    energy_joules: f64,
}

impl ChargingLogRow {
    pub fn vehicle(&self) -> &Id<Vehicle> {
        &self.vehicle
    }

    pub fn link(&self) -> &Id<Link> {
        &self.link
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn energy_joules(&self) -> f64 {
        self.energy_joules
    }
}

/// Append only record of all charging sessions of a run. One instance is created per run and handed
/// to every agent thread behind an `Arc`. Appends are serialized, so rows appear in the order in
/// which `record_session` was called.
#[derive(Debug, Default)]
pub struct ChargingLog {
    rows: Mutex<Vec<ChargingLogRow>>,
}

impl ChargingLog {
    pub fn new() -> Self {
        ChargingLog::default()
    }

    pub fn record_session(
        &self,
        vehicle: Id<Vehicle>,
        link: Id<Link>,
        start_time: f64,
        duration: f64,
        energy_joules: f64,
    ) -> SimResult<ChargingLogRow> {
        validate_session(start_time, duration, energy_joules)?;
        let row = ChargingLogRow {
            vehicle,
            link,
            start_time,
            duration,
            energy_joules,
        };
        self.rows.lock().push(row.clone());
        Ok(row)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Copy of the rows recorded so far.
    pub fn rows(&self) -> Vec<ChargingLogRow> {
        self.rows.lock().clone()
    }

    pub fn total_energy_joules(&self) -> f64 {
        self.rows.lock().iter().map(|r| r.energy_joules).sum()
    }

    /// Charged energy summed up per link.
    pub fn aggregate_by_link(&self) -> IntMap<Id<Link>, f64> {
        let mut result = IntMap::default();
        for row in self.rows.lock().iter() {
            *result.entry(row.link.clone()).or_insert(0.) += row.energy_joules;
        }
        result
    }

    /// Ends the log and hands all rows over in submission order.
    pub fn into_rows(self) -> Vec<ChargingLogRow> {
        self.rows.into_inner()
    }
}

fn validate_session(start_time: f64, duration: f64, energy_joules: f64) -> SimResult<()> {
    for (name, value) in [
        ("start time", start_time),
        ("duration", duration),
        ("energy", energy_joules),
    ] {
        if !value.is_finite() || value < 0. {
            return Err(EnergyError::InvalidChargingRecord(format!(
                "{name} must be finite and non-negative, was {value}"
            )));
        }
    }
    Ok(())
}

/// Charges `vehicle` at `link` with a charger of `power_w` watts for `duration` seconds and records
/// the session. The battery takes at most what fits, so the recorded energy may be less than
/// `power_w * duration`. Nothing changes if the session is invalid or the vehicle has no battery.
pub fn charge_at_link(
    vehicle: &mut Vehicle,
    link: &Id<Link>,
    start_time: f64,
    duration: f64,
    power_w: f64,
    log: &ChargingLog,
) -> SimResult<ChargingLogRow> {
    if !power_w.is_finite() || power_w < 0. {
        return Err(EnergyError::InvalidChargingRecord(format!(
            "charging power must be finite and non-negative, was {power_w}"
        )));
    }
    let offered = power_w * duration;
    validate_session(start_time, duration, offered)?;

    let accepted = vehicle.charge(offered)?;
    debug!(
        vehicle = %vehicle.id(),
        link = %link,
        offered,
        accepted,
        soc = ?vehicle.soc(),
        "charged vehicle"
    );
    log.record_session(
        vehicle.id().clone(),
        link.clone(),
        start_time,
        duration,
        accepted,
    )
}
