use crate::simulation::identities::{Facility, Link, Person};
use crate::simulation::vehicles::{Vehicle, VehicleType};

/// Type discriminant of the id store. The values must stay stable, as they are used to tell the
/// id types apart in the store.
pub trait StableTypeId {
    fn stable_type_id() -> u64;
}

impl StableTypeId for () {
    fn stable_type_id() -> u64 {
        0
    }
}

impl StableTypeId for String {
    fn stable_type_id() -> u64 {
        STRING_TYPE_ID
    }
}

impl StableTypeId for Person {
    fn stable_type_id() -> u64 {
        PERSON_TYPE_ID
    }
}

impl StableTypeId for Link {
    fn stable_type_id() -> u64 {
        LINK_TYPE_ID
    }
}

impl StableTypeId for Facility {
    fn stable_type_id() -> u64 {
        FACILITY_TYPE_ID
    }
}

impl StableTypeId for VehicleType {
    fn stable_type_id() -> u64 {
        VEHICLE_TYPE_TYPE_ID
    }
}

impl StableTypeId for Vehicle {
    fn stable_type_id() -> u64 {
        VEHICLE_TYPE_ID
    }
}

pub const STRING_TYPE_ID: u64 = 1;
pub const PERSON_TYPE_ID: u64 = 2;
pub const LINK_TYPE_ID: u64 = 3;
pub const FACILITY_TYPE_ID: u64 = 4;
pub const VEHICLE_TYPE_TYPE_ID: u64 = 5;
pub const VEHICLE_TYPE_ID: u64 = 6;
