//! Distance filter builder.
//!
//! `search.within(5.0).kilometers().of(point)` anchors the search at
//! `point` and keeps matches whose `@geodist` is at most five kilometers,
//! converted to the meters the index server works in.

use quarry_core::{DistanceUnit, Result, ToLatLng};

use crate::search::{GEODIST_ATTR, Search};

/// Pending distance filter, returned by [`Search::within`].
#[derive(Debug)]
pub struct GeoDistanceBuilder {
    search: Search,
    distance: f64,
    unit: DistanceUnit,
}

impl GeoDistanceBuilder {
    pub(crate) fn new(search: Search, distance: f64) -> Self {
        Self {
            search,
            distance,
            unit: DistanceUnit::default(),
        }
    }

    /// Distance is in meters (the default).
    pub fn meters(self) -> Self {
        self.in_unit(DistanceUnit::Meters)
    }

    /// Distance is in kilometers.
    pub fn kilometers(self) -> Self {
        self.in_unit(DistanceUnit::Kilometers)
    }

    /// Distance is in feet.
    pub fn feet(self) -> Self {
        self.in_unit(DistanceUnit::Feet)
    }

    /// Distance is in statute miles.
    pub fn miles(self) -> Self {
        self.in_unit(DistanceUnit::Miles)
    }

    /// Distance is in yards.
    pub fn yards(self) -> Self {
        self.in_unit(DistanceUnit::Yards)
    }

    /// Choose the unit by name, failing with
    /// [`Error::InvalidUnits`](quarry_core::Error::InvalidUnits).
    pub fn units(self, name: &str) -> Result<Self> {
        Ok(self.in_unit(name.parse()?))
    }

    /// Selected unit.
    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    fn in_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Anchor at `point` and filter `@geodist` to `[0, distance]` meters.
    pub fn of(self, point: impl ToLatLng) -> Result<Search> {
        let meters = self.unit.to_meters(self.distance);
        self.search.anchor(point)?.filter(GEODIST_ATTR, meters)
    }
}
