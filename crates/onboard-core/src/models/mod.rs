//! Data models for backend entities.
//!
//! - `Employee`, `Registration`: the employee record and the sign-up payload
//! - `Department`: the closed department catalogue
//! - `Todo`, `TodoDraft`: personal tasks
//!
//! The backend is inconsistent about identifier types (numbers on some
//! endpoints, strings on others), so ids are normalised to `String`.

pub mod department;
pub mod employee;
pub mod todo;

pub use department::Department;
pub use employee::{Employee, Registration, BENEFIT_OPTIONS};
pub use todo::{Todo, TodoDraft};

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Deserialize an identifier that may arrive as a JSON number or string.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional variant of [`id_string`].
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
