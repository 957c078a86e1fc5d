//! Snapshot entries: single data points and atomically captured groups.

use serde::{Deserialize, Serialize};

/// One telemetry sample.
///
/// `value` is kept as text so literal decimal digits survive edits that do
/// not touch it; numeric operations parse and re-render it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    pub namespace: String,
    pub id: String,
    pub value: String,
    pub arrival_time: i64,
}

impl DataPoint {
    pub fn new(
        namespace: impl Into<String>,
        id: impl Into<String>,
        value: impl Into<String>,
        arrival_time: i64,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
            value: value.into(),
            arrival_time,
        }
    }
}

/// Data points captured together at one arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataGroup {
    pub arrival_time: i64,
    pub points: Vec<DataPoint>,
}

impl DataGroup {
    /// Creates a group, aligning every member to the group's arrival time.
    pub fn new(arrival_time: i64, mut points: Vec<DataPoint>) -> Self {
        for point in &mut points {
            point.arrival_time = arrival_time;
        }
        Self {
            arrival_time,
            points,
        }
    }
}

/// A snapshot entry, ordered by arrival time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Point(DataPoint),
    Group(DataGroup),
}

impl Entry {
    pub const fn arrival_time(&self) -> i64 {
        match self {
            Self::Point(point) => point.arrival_time,
            Self::Group(group) => group.arrival_time,
        }
    }

    /// Moves the entry in time. Group members follow the group.
    pub fn set_arrival_time(&mut self, time: i64) {
        match self {
            Self::Point(point) => point.arrival_time = time,
            Self::Group(group) => {
                group.arrival_time = time;
                for point in &mut group.points {
                    point.arrival_time = time;
                }
            }
        }
    }

    /// The namespace this entry is indexed under.
    ///
    /// For a group this is its first member's namespace; an empty group has
    /// none.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Point(point) => Some(&point.namespace),
            Self::Group(group) => group.points.first().map(|p| p.namespace.as_str()),
        }
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        match self {
            Self::Point(point) => namespace.clone_into(&mut point.namespace),
            Self::Group(group) => {
                for point in &mut group.points {
                    namespace.clone_into(&mut point.namespace);
                }
            }
        }
    }

    /// Number of data points carried by this entry.
    pub fn point_count(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::Group(group) => group.points.len(),
        }
    }

    /// Iterates the data points of this entry, group members included.
    pub fn points(&self) -> impl Iterator<Item = &DataPoint> {
        let slice = match self {
            Self::Point(point) => std::slice::from_ref(point),
            Self::Group(group) => group.points.as_slice(),
        };
        slice.iter()
    }

    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut DataPoint> {
        let slice = match self {
            Self::Point(point) => std::slice::from_mut(point),
            Self::Group(group) => group.points.as_mut_slice(),
        };
        slice.iter_mut()
    }
}

impl From<DataPoint> for Entry {
    fn from(point: DataPoint) -> Self {
        Self::Point(point)
    }
}

impl From<DataGroup> for Entry {
    fn from(group: DataGroup) -> Self {
        Self::Group(group)
    }
}
