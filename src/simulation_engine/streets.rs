use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreetId(pub u32);

impl fmt::Display for StreetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A street connecting two intersections. Streets are compared by id only.
#[derive(Debug, Clone)]
pub struct Street {
    pub id: StreetId,
    pub name: String,
    pub length_meters: f64,
}

impl Street {
    pub fn new(id: u32, name: impl Into<String>, length_meters: f64) -> Self {
        Self {
            id: StreetId(id),
            name: name.into(),
            length_meters,
        }
    }
}

impl PartialEq for Street {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Street {}
