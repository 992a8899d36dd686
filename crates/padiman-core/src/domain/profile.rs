//! Local profile: the part of the user's profile the core reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geo::GeoPoint;
use super::task::RevealedContact;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLocation {
    #[serde(default)]
    pub address: Option<String>,
    /// Fields owned by the profile form (country, city, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profile as stored by the profile form. Fields the core doesn't read are
/// carried through `extra` so saving never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: ProfileLocation,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn contact(&self) -> RevealedContact {
        RevealedContact {
            phone: self.phone.clone(),
            address: self.location.address.clone(),
        }
    }
}
