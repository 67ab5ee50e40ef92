use serde::{Deserialize, Serialize};

use crate::simulation::error::{EnergyError, SimResult};
use crate::simulation::id::Id;
use crate::simulation::identities::{Facility, Person};
use crate::simulation::parking::{check_price, ParkingCostModel, SECONDS_PER_DAY, SECONDS_PER_HOUR};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeParking {}

#[typetag::serde]
impl ParkingCostModel for FreeParking {
    fn parking_cost(&self, _: f64, _: f64, _: &Id<Person>, _: &Id<Facility>) -> f64 {
        0.
    }
}

/// Charges by the hour, independent of when the stay starts. The optional base fee is due for every
/// stay, including very short ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatRateParams", into = "FlatRateParams")]
pub struct FlatRateParkingCost {
    cost_per_hour: f64,
    base_fee: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FlatRateParams {
    cost_per_hour: f64,
    #[serde(default)]
    base_fee: f64,
}

impl FlatRateParkingCost {
    pub fn new(cost_per_hour: f64) -> SimResult<Self> {
        check_price("cost_per_hour", cost_per_hour)?;
        Ok(FlatRateParkingCost {
            cost_per_hour,
            base_fee: 0.,
        })
    }

    pub fn with_base_fee(mut self, base_fee: f64) -> SimResult<Self> {
        check_price("base_fee", base_fee)?;
        self.base_fee = base_fee;
        Ok(self)
    }

    pub fn cost_per_hour(&self) -> f64 {
        self.cost_per_hour
    }

    pub fn base_fee(&self) -> f64 {
        self.base_fee
    }
}

impl TryFrom<FlatRateParams> for FlatRateParkingCost {
    type Error = EnergyError;

    fn try_from(value: FlatRateParams) -> Result<Self, Self::Error> {
        FlatRateParkingCost::new(value.cost_per_hour)?.with_base_fee(value.base_fee)
    }
}

impl From<FlatRateParkingCost> for FlatRateParams {
    fn from(value: FlatRateParkingCost) -> Self {
        FlatRateParams {
            cost_per_hour: value.cost_per_hour,
            base_fee: value.base_fee,
        }
    }
}

#[typetag::serde]
impl ParkingCostModel for FlatRateParkingCost {
    fn parking_cost(&self, _: f64, duration: f64, _: &Id<Person>, _: &Id<Facility>) -> f64 {
        self.base_fee + self.cost_per_hour * duration / SECONDS_PER_HOUR
    }
}

/// Hourly rate which applies between `start_s` and `end_s`, both given as seconds after midnight.
/// A window with `start_s > end_s` wraps around midnight, e.g. 22:00 to 06:00.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateWindow {
    pub start_s: f64,
    pub end_s: f64,
    pub cost_per_hour: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start: f64,
    end: f64,
    cost_per_hour: f64,
}

impl Segment {
    fn cost(&self, from: f64, length: f64) -> f64 {
        let span = (self.end - from).min(length);
        self.cost_per_hour * span / SECONDS_PER_HOUR
    }
}

/// Hourly rates which depend on the time of day. Times not covered by any window are charged with
/// `default_cost_per_hour`. Stays may last several days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeOfDayParams", into = "TimeOfDayParams")]
pub struct TimeOfDayParkingCost {
    windows: Vec<RateWindow>,
    default_cost_per_hour: f64,
    // covers [0, SECONDS_PER_DAY) without gaps, sorted by start
    segments: Vec<Segment>,
    day_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeOfDayParams {
    windows: Vec<RateWindow>,
    #[serde(default)]
    default_cost_per_hour: f64,
}

impl TimeOfDayParkingCost {
    pub fn new(windows: Vec<RateWindow>, default_cost_per_hour: f64) -> SimResult<Self> {
        check_price("default_cost_per_hour", default_cost_per_hour)?;

        let mut covered = Vec::with_capacity(windows.len() + 1);
        for window in &windows {
            check_price("cost_per_hour", window.cost_per_hour)?;
            let starts_in_day = (0. ..SECONDS_PER_DAY).contains(&window.start_s);
            let ends_in_day = (0. ..=SECONDS_PER_DAY).contains(&window.end_s);
            if !starts_in_day || !ends_in_day || window.start_s == window.end_s {
                return Err(EnergyError::InvalidConfig(format!(
                    "rate window must lie within one day and must not be empty, was {window:?}"
                )));
            }
            let segment = |start, end| Segment {
                start,
                end,
                cost_per_hour: window.cost_per_hour,
            };
            if window.start_s < window.end_s {
                covered.push(segment(window.start_s, window.end_s));
            } else {
                covered.push(segment(window.start_s, SECONDS_PER_DAY));
                if window.end_s > 0. {
                    covered.push(segment(0., window.end_s));
                }
            }
        }
        covered.retain(|s| s.end > s.start);
        covered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut segments = Vec::with_capacity(covered.len() * 2 + 1);
        let mut cursor = 0.;
        for segment in covered {
            if segment.start < cursor {
                return Err(EnergyError::InvalidConfig(format!(
                    "rate windows overlap at {}s after midnight",
                    segment.start
                )));
            }
            if segment.start > cursor {
                segments.push(Segment {
                    start: cursor,
                    end: segment.start,
                    cost_per_hour: default_cost_per_hour,
                });
            }
            cursor = segment.end;
            segments.push(segment);
        }
        if cursor < SECONDS_PER_DAY {
            segments.push(Segment {
                start: cursor,
                end: SECONDS_PER_DAY,
                cost_per_hour: default_cost_per_hour,
            });
        }

        let day_cost = segments
            .iter()
            .map(|s| s.cost(s.start, SECONDS_PER_DAY))
            .sum();

        Ok(TimeOfDayParkingCost {
            windows,
            default_cost_per_hour,
            segments,
            day_cost,
        })
    }

    pub fn windows(&self) -> &[RateWindow] {
        &self.windows
    }

    /// Cost of a stay lasting a whole day.
    pub fn day_cost(&self) -> f64 {
        self.day_cost
    }

    /// Cost of a stay of less than a day starting at `time_of_day`.
    fn partial_day_cost(&self, time_of_day: f64, length: f64) -> f64 {
        let n = self.segments.len();
        let first = self
            .segments
            .partition_point(|s| s.end <= time_of_day)
            .min(n - 1);

        let mut remaining = length;
        let mut cost = 0.;
        // a partial day touches every segment at most once plus the first one again after midnight
        for i in 0..=n {
            if remaining <= 0. {
                break;
            }
            let segment = &self.segments[(first + i) % n];
            let from = if i == 0 { time_of_day } else { segment.start };
            let span = (segment.end - from).min(remaining);
            cost += segment.cost(from, remaining);
            remaining -= span;
        }
        cost
    }
}

impl TryFrom<TimeOfDayParams> for TimeOfDayParkingCost {
    type Error = EnergyError;

    fn try_from(value: TimeOfDayParams) -> Result<Self, Self::Error> {
        TimeOfDayParkingCost::new(value.windows, value.default_cost_per_hour)
    }
}

impl From<TimeOfDayParkingCost> for TimeOfDayParams {
    fn from(value: TimeOfDayParkingCost) -> Self {
        TimeOfDayParams {
            windows: value.windows,
            default_cost_per_hour: value.default_cost_per_hour,
        }
    }
}

#[typetag::serde]
impl ParkingCostModel for TimeOfDayParkingCost {
    fn parking_cost(
        &self,
        arrival_time: f64,
        duration: f64,
        _: &Id<Person>,
        _: &Id<Facility>,
    ) -> f64 {
        let days = (duration / SECONDS_PER_DAY).floor();
        let rest = duration - days * SECONDS_PER_DAY;
        let time_of_day = arrival_time.rem_euclid(SECONDS_PER_DAY);
        days * self.day_cost + self.partial_day_cost(time_of_day, rest)
    }
}

/// Price for stays up to `max_duration_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationTier {
    pub max_duration_s: f64,
    pub cost: f64,
}

/// Prices a stay by its length. The first tier long enough for the stay sets the price. Stays
/// longer than the last tier pay its price plus `cost_per_hour_beyond` for every additional hour.
/// With a daily cap, a stay never costs more than the cap times the number of started days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DurationTieredParams", into = "DurationTieredParams")]
pub struct DurationTieredParkingCost {
    tiers: Vec<DurationTier>,
    cost_per_hour_beyond: f64,
    daily_cap: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DurationTieredParams {
    tiers: Vec<DurationTier>,
    #[serde(default)]
    cost_per_hour_beyond: f64,
    #[serde(default)]
    daily_cap: Option<f64>,
}

impl DurationTieredParkingCost {
    pub fn new(mut tiers: Vec<DurationTier>, cost_per_hour_beyond: f64) -> SimResult<Self> {
        if tiers.is_empty() {
            return Err(EnergyError::InvalidConfig(String::from(
                "duration tiered parking needs at least one tier",
            )));
        }
        for tier in &tiers {
            check_price("max_duration_s", tier.max_duration_s)?;
            check_price("cost", tier.cost)?;
        }
        check_price("cost_per_hour_beyond", cost_per_hour_beyond)?;
        tiers.sort_by(|a, b| a.max_duration_s.total_cmp(&b.max_duration_s));

        Ok(DurationTieredParkingCost {
            tiers,
            cost_per_hour_beyond,
            daily_cap: None,
        })
    }

    pub fn with_daily_cap(mut self, daily_cap: f64) -> SimResult<Self> {
        check_price("daily_cap", daily_cap)?;
        self.daily_cap = Some(daily_cap);
        Ok(self)
    }

    pub fn tiers(&self) -> &[DurationTier] {
        &self.tiers
    }

    pub fn daily_cap(&self) -> Option<f64> {
        self.daily_cap
    }

    fn tier_price(&self, duration: f64) -> f64 {
        if let Some(tier) = self.tiers.iter().find(|t| duration <= t.max_duration_s) {
            return tier.cost;
        }
        // tiers are never empty, see new()
        let last = self.tiers[self.tiers.len() - 1];
        last.cost + self.cost_per_hour_beyond * (duration - last.max_duration_s) / SECONDS_PER_HOUR
    }
}

impl TryFrom<DurationTieredParams> for DurationTieredParkingCost {
    type Error = EnergyError;

    fn try_from(value: DurationTieredParams) -> Result<Self, Self::Error> {
        let model = DurationTieredParkingCost::new(value.tiers, value.cost_per_hour_beyond)?;
        match value.daily_cap {
            Some(cap) => model.with_daily_cap(cap),
            None => Ok(model),
        }
    }
}

impl From<DurationTieredParkingCost> for DurationTieredParams {
    fn from(value: DurationTieredParkingCost) -> Self {
        DurationTieredParams {
            tiers: value.tiers,
            cost_per_hour_beyond: value.cost_per_hour_beyond,
            daily_cap: value.daily_cap,
        }
    }
}

#[typetag::serde]
impl ParkingCostModel for DurationTieredParkingCost {
    fn parking_cost(&self, _: f64, duration: f64, _: &Id<Person>, _: &Id<Facility>) -> f64 {
        let price = self.tier_price(duration);
        match self.daily_cap {
            Some(cap) => {
                let started_days = (duration / SECONDS_PER_DAY).ceil().max(1.);
                price.min(cap * started_days)
            }
            None => price,
        }
    }
}
