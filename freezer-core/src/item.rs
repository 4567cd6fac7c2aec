use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FreezerError;

/// Stable identifier for items across edits (UUID format when generated here)
pub type ItemId = String;

/// Storage zone inside the freezer. Every item is in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    TopDrawer,
    BottomDrawer,
    Door,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::TopDrawer, Location::BottomDrawer, Location::Door];

    /// Human-readable section title.
    pub fn label(&self) -> &'static str {
        match self {
            Location::TopDrawer => "Top Drawer",
            Location::BottomDrawer => "Bottom Drawer",
            Location::Door => "Door",
        }
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "top-drawer" | "top" => Ok(Location::TopDrawer),
            "bottom-drawer" | "bottom" => Ok(Location::BottomDrawer),
            "door" => Ok(Location::Door),
            _ => Err(format!("unknown location: {}", s)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::TopDrawer => write!(f, "top-drawer"),
            Location::BottomDrawer => write!(f, "bottom-drawer"),
            Location::Door => write!(f, "door"),
        }
    }
}

/// A tracked freezer entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub location: Location,
    /// Set once at creation; updates never change it.
    pub added_at: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Item {
    /// Creates a new item with a fresh id, stamped as added now.
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        location: Location,
        expires_on: DateTime<Utc>,
    ) -> Self {
        Item {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            quantity,
            unit: unit.into(),
            location,
            added_at: Utc::now(),
            expires_on,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks the field constraints a stored item must satisfy.
    pub fn validate(&self) -> Result<(), FreezerError> {
        if self.id.trim().is_empty() {
            return Err(FreezerError::InvalidItem {
                id: self.id.clone(),
                reason: "id must not be empty".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(FreezerError::InvalidItem {
                id: self.id.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(FreezerError::InvalidItem {
                id: self.id.clone(),
                reason: format!("quantity must be positive, got {}", self.quantity),
            });
        }
        Ok(())
    }
}
