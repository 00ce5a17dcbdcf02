use indexmap::IndexMap;

use serde::{Deserialize, Serialize};

use crate::link::parse_links;

/// Path marker identifying accelerometer sensors.
pub const ACCELEROMETER_MARKER: &str = "sensors/accel";

/// Path marker identifying every sensor of a node.
pub const SENSOR_MARKER: &str = "sensors";

/// Path marker identifying RGB led actuators.
pub const LED_COLOR_MARKER: &str = "led/color";

/// The role an endpoint plays in the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// An endpoint which is read to obtain a value.
    Sensor,
    /// An endpoint which is written to change the state of a device.
    Actuator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
        })
    }
}

/// An addressable endpoint advertised by the resource directory.
///
/// The path is kept exactly as the directory published it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: String,
    role: Role,
}

impl Endpoint {
    /// Creates an [`Endpoint`].
    #[must_use]
    #[inline]
    pub fn new(path: impl Into<String>, role: Role) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    /// Creates a sensor [`Endpoint`].
    #[must_use]
    #[inline]
    pub fn sensor(path: impl Into<String>) -> Self {
        Self::new(path, Role::Sensor)
    }

    /// Creates an actuator [`Endpoint`].
    #[must_use]
    #[inline]
    pub fn actuator(path: impl Into<String>) -> Self {
        Self::new(path, Role::Actuator)
    }

    /// Returns the endpoint path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the endpoint [`Role`].
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// An ordered set of path markers used to assign a [`Role`] to a path.
///
/// A path takes the role of the first marker it contains. Paths which
/// contain no marker are not part of the control loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMarkers(IndexMap<String, Role>);

impl Default for RoleMarkers {
    fn default() -> Self {
        Self::empty()
            .marker(ACCELEROMETER_MARKER, Role::Sensor)
            .marker(LED_COLOR_MARKER, Role::Actuator)
    }
}

impl RoleMarkers {
    /// Creates [`RoleMarkers`] without any marker.
    #[must_use]
    #[inline]
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    /// Creates [`RoleMarkers`] classifying every path containing
    /// [`SENSOR_MARKER`] as a sensor, whatever its kind.
    #[must_use]
    #[inline]
    pub fn sensors() -> Self {
        Self::empty().marker(SENSOR_MARKER, Role::Sensor)
    }

    /// Adds a marker.
    ///
    /// Adding an already present marker replaces its role but keeps its
    /// position.
    #[must_use]
    #[inline]
    pub fn marker(mut self, marker: impl Into<String>, role: Role) -> Self {
        let _ = self.0.insert(marker.into(), role);
        self
    }

    /// Checks whether there are no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Classifies a path by substring match.
    #[must_use]
    pub fn classify(&self, path: &str) -> Option<Role> {
        self.0
            .iter()
            .find(|(marker, _)| path.contains(marker.as_str()))
            .map(|(_, role)| *role)
    }

    /// Parses a directory document and returns its classified endpoints,
    /// in document order.
    ///
    /// Links which match no marker are dropped.
    #[must_use]
    pub fn endpoints(&self, document: &str) -> Vec<Endpoint> {
        parse_links(document)
            .into_iter()
            .filter_map(|link| {
                self.classify(link.path)
                    .map(|role| Endpoint::new(link.path, role))
            })
            .collect()
    }
}

/// The endpoints of a single directory fetch, split by role.
///
/// Sensors and actuators of a snapshot always come from the same document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Sensor endpoints, in document order.
    pub sensors: Vec<Endpoint>,
    /// Actuator endpoints, in document order.
    pub actuators: Vec<Endpoint>,
}

impl Snapshot {
    /// Splits a sequence of endpoints by role.
    #[must_use]
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        let (sensors, actuators): (Vec<_>, Vec<_>) = endpoints
            .into_iter()
            .partition(|endpoint| endpoint.role() == Role::Sensor);
        Self { sensors, actuators }
    }

    /// Checks whether the snapshot has neither sensors nor actuators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.actuators.is_empty()
    }
}
