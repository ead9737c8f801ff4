//! Plant model.

use greenhouse_core::{Problems, Validate};
use serde::{Deserialize, Serialize};

/// A stored plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name, never empty.
    pub name: String,
    /// Height, never negative.
    pub height: i64,
}

/// Creation payload for a [`Plant`].
///
/// Missing fields decode to their zero values and are then caught by
/// validation. An `id` in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPlant {
    /// Display name.
    pub name: String,
    /// Height.
    pub height: i64,
}

impl NewPlant {
    /// Creates a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, height: i64) -> Self {
        Self {
            name: name.into(),
            height,
        }
    }

    /// Attaches an id, producing the stored form.
    #[must_use]
    pub fn into_plant(self, id: String) -> Plant {
        Plant {
            id,
            name: self.name,
            height: self.height,
        }
    }
}

impl Validate for NewPlant {
    fn validate(&self) -> Problems {
        let mut problems = Problems::new();
        if self.name.is_empty() {
            problems.insert("name".to_string(), "name cannot be empty".to_string());
        }
        if self.height < 0 {
            problems.insert("height".to_string(), "height cannot be negative".to_string());
        }
        problems
    }
}
