//! Local document mirror: the in-memory authoritative record of published
//! entities and their visual state.
//!
//! Mutations here never consult viewer availability. The mirror is the single
//! source of truth whether or not a viewer is attached, so a headless batch
//! run observes exactly the same state a connected run would.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Identifier of an entity in the host document.
pub type EntityId = i64;

/// RGB triple, 0-255 per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Colour {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Named colours available to hosts that do not pick exact channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColourSelection {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    White,
    Black,
    Grey,
    SteelBlue,
}

impl ColourSelection {
    /// Palette lookup for the named selection.
    pub fn colour(&self) -> Colour {
        match self {
            ColourSelection::Red => Colour::rgb(220, 50, 47),
            ColourSelection::Green => Colour::rgb(80, 161, 79),
            ColourSelection::Blue => Colour::rgb(38, 110, 210),
            ColourSelection::Yellow => Colour::rgb(229, 192, 18),
            ColourSelection::Orange => Colour::rgb(222, 120, 34),
            ColourSelection::Purple => Colour::rgb(125, 70, 183),
            ColourSelection::White => Colour::rgb(255, 255, 255),
            ColourSelection::Black => Colour::rgb(20, 20, 20),
            ColourSelection::Grey => Colour::rgb(128, 128, 128),
            ColourSelection::SteelBlue => Colour::rgb(70, 130, 180),
        }
    }
}

/// One document entity exposed to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEntity {
    /// Session-monotonic publish order; basis of export filenames. Distinct
    /// from any viewer-assigned ID.
    pub ordinal: u64,
    /// Identifier in the host document.
    pub local_id: EntityId,
    pub name: String,
    pub visible: bool,
    pub colour: Colour,
    /// 0.0 (fully transparent) to 1.0 (opaque).
    pub opacity: f64,
}

impl PublishedEntity {
    /// Default visual state for a freshly published entity.
    pub fn published(ordinal: u64, local_id: EntityId, name: &str) -> Self {
        Self {
            ordinal,
            local_id,
            name: name.to_string(),
            visible: true,
            colour: ColourSelection::Grey.colour(),
            opacity: 1.0,
        }
    }
}

/// Mirror of published entities, keyed by their host-document ID.
#[derive(Debug, Default)]
pub struct DocumentMirror {
    entities: HashMap<EntityId, PublishedEntity>,
}

impl DocumentMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a publish. An entity must exist here before any visibility or
    /// colour state can be observed for it.
    pub fn record_published(&mut self, entity: PublishedEntity) {
        self.entities.insert(entity.local_id, entity);
    }

    /// Set visibility. Unknown IDs are ignored; repeated calls with the same
    /// value are no-ops.
    pub fn set_visibility(&mut self, local_id: EntityId, visible: bool) {
        match self.entities.get_mut(&local_id) {
            Some(entity) => entity.visible = visible,
            None => debug!("set_visibility on unpublished entity {}", local_id),
        }
    }

    /// Set opacity, clamped into `[0.0, 1.0]`.
    pub fn set_opacity(&mut self, local_id: EntityId, opacity: f64) {
        match self.entities.get_mut(&local_id) {
            Some(entity) => entity.opacity = opacity.clamp(0.0, 1.0),
            None => debug!("set_opacity on unpublished entity {}", local_id),
        }
    }

    /// Set colour.
    pub fn set_colour(&mut self, local_id: EntityId, colour: Colour) {
        match self.entities.get_mut(&local_id) {
            Some(entity) => entity.colour = colour,
            None => debug!("set_colour on unpublished entity {}", local_id),
        }
    }

    pub fn get(&self, local_id: EntityId) -> Option<&PublishedEntity> {
        self.entities.get(&local_id)
    }

    pub fn contains(&self, local_id: EntityId) -> bool {
        self.entities.contains_key(&local_id)
    }

    /// IDs of all published entities, in no particular order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublishedEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
