use serde::{Deserialize, Serialize};

pub const STATUSES: [&str; 4] = ["retired", "active", "management", "deceased"];
pub const GENDERS: [&str; 2] = ["male", "female"];

/// Biographical and career record of an astronaut.
///
/// Also used as the creation payload; any `id` sent by a client is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Astronaut {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub group: i32,
    pub status: String,
    pub birth_date: String,
    pub birth_place: String,
    pub gender: String,
    pub alma_mater: Vec<String>,
    pub undergraduate_major: Vec<String>,
    pub graduate_major: Vec<String>,
    pub military_rank: Option<String>,
    pub military_branch: Option<String>,
    pub space_flights: i32,
    pub space_flight_hours: i32,
    pub space_walks: i32,
    pub space_walk_hours: i32,
    pub missions: Vec<String>,
    pub death_date: Option<String>,
    pub death_mission: Option<String>,
}

/// Canonical stored form of a status or gender value.
#[must_use]
pub fn canonical(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Astronaut {
    /// Lower-cases the enumerated fields so stored values compare exactly.
    pub fn normalize(&mut self) {
        self.status = canonical(&self.status);
        self.gender = canonical(&self.gender);
    }
}

/// Partial update payload. Only the scalar fields listed here take part in
/// the merge; birth date and the list/count fields are fixed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AstronautUpdate {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub group: Option<i32>,
    pub status: Option<String>,
    pub birth_place: Option<String>,
    pub gender: Option<String>,
}
