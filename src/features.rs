//! Feature Registry
//!
//! Static catalog of toggleable features and the memory operations each one
//! issues. The registry carries no enable/disable semantics; it only lists
//! operations in a fixed declared order per feature.

use serde::{Deserialize, Serialize};

/// A byte or numeric mutation at an offset from the target module base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Overwrite with fixed bytes
    Patch {
        offset: usize,
        bytes: &'static [u8],
    },
    /// Overwrite `size` bytes with NOP instructions
    Nop { offset: usize, size: usize },
    /// Overwrite with a little-endian f32
    FloatSet { offset: usize, value: f32 },
}

impl Operation {
    pub fn offset(&self) -> usize {
        match self {
            Operation::Patch { offset, .. }
            | Operation::Nop { offset, .. }
            | Operation::FloatSet { offset, .. } => *offset,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Patch { .. } => "patch",
            Operation::Nop { .. } => "nop",
            Operation::FloatSet { .. } => "float",
        }
    }
}

/// Named, user-toggleable bundle of operations
#[derive(Debug, PartialEq)]
pub struct Feature {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub group: FeatureGroup,
    pub operations: &'static [Operation],
}

/// Catalog sections, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureGroup {
    Player,
    Movement,
    Camera,
    Settings,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 4] = [
        FeatureGroup::Player,
        FeatureGroup::Movement,
        FeatureGroup::Camera,
        FeatureGroup::Settings,
    ];
}

const fn patch(offset: usize, bytes: &'static [u8]) -> Operation {
    Operation::Patch { offset, bytes }
}

const fn nop(offset: usize, size: usize) -> Operation {
    Operation::Nop { offset, size }
}

const fn float(offset: usize, value: f32) -> Operation {
    Operation::FloatSet { offset, value }
}

static CATALOG: &[Feature] = &[
    // Player
    Feature {
        id: "godmode",
        label: "Godmode",
        description: "Enables invincibility against all damage sources",
        group: FeatureGroup::Player,
        operations: &[patch(0x2FF40E2, &[0x01])],
    },
    Feature {
        id: "infinite-energy",
        label: "Infinite Energy",
        description: "Never run out of wing energy",
        group: FeatureGroup::Player,
        operations: &[patch(0x2FF40E1, &[0x01])],
    },
    Feature {
        id: "infinite-breath",
        label: "Infinite Breath",
        description: "Never run out of breath underwater",
        group: FeatureGroup::Player,
        operations: &[nop(0x1A5DAD2, 6)],
    },
    Feature {
        id: "anti-rain",
        label: "Anti Rain Drain",
        description: "Prevents rain from draining your light",
        group: FeatureGroup::Player,
        operations: &[patch(0x2FF40E6, &[0x01])],
    },
    Feature {
        id: "anti-afk",
        label: "Anti AFK",
        description: "Prevents entering AFK state when idle",
        group: FeatureGroup::Player,
        operations: &[patch(0x286B3FC, &[0x00])],
    },
    // Movement
    Feature {
        id: "super-jump",
        label: "Super Jump",
        description: "Jump further",
        group: FeatureGroup::Movement,
        operations: &[patch(0x23117EC, &[0x00, 0x00, 0x20, 0x41, 0x9A])],
    },
    Feature {
        id: "super-swim",
        label: "Super Swim",
        description: "Swim faster",
        group: FeatureGroup::Movement,
        operations: &[patch(0x27BD7E0, &[0x00, 0x00, 0x48, 0x42, 0x6F])],
    },
    Feature {
        id: "super-flight",
        label: "Super Flight",
        description: "Fly faster",
        group: FeatureGroup::Movement,
        operations: &[patch(0xA5C842, &[0xC7, 0x01, 0x00, 0x00, 0xC8, 0x42])],
    },
    Feature {
        id: "anti-sink",
        label: "Anti Sink",
        description: "Prevents sinking in water",
        group: FeatureGroup::Movement,
        operations: &[float(0x27BDA30, 100.0)],
    },
    // Camera
    Feature {
        id: "disable-cam-snap",
        label: "Disable Camera Snapping",
        description: "Prevents camera from automatically snapping",
        group: FeatureGroup::Camera,
        operations: &[patch(0x27A7885, &[0x00])],
    },
    Feature {
        id: "free-zoom",
        label: "Disable Zoom Restrictions",
        description: "Removes limits on camera zoom",
        group: FeatureGroup::Camera,
        operations: &[nop(0x3579D5, 9)],
    },
    Feature {
        id: "disable-cam-rotation",
        label: "Disable Camera Rotation",
        description: "Prevents camera from rotating",
        group: FeatureGroup::Camera,
        operations: &[nop(0x3530C8, 2)],
    },
    Feature {
        id: "first-person",
        label: "First Person",
        description: "Enables first-person camera mode",
        group: FeatureGroup::Camera,
        operations: &[nop(0x2311854, 5)],
    },
    // Settings
    Feature {
        id: "show-cursor",
        label: "Show Cursor",
        description: "Keeps the system cursor visible while in-game.",
        group: FeatureGroup::Settings,
        operations: &[patch(0x2F96890, &[0x01])],
    },
];

/// Every feature, in catalog order
pub fn all() -> &'static [Feature] {
    CATALOG
}

/// Look up a feature by id
pub fn find(id: &str) -> Option<&'static Feature> {
    CATALOG.iter().find(|f| f.id == id)
}

/// Members of one group, in catalog order
pub fn group(group: FeatureGroup) -> Vec<&'static Feature> {
    CATALOG.iter().filter(|f| f.group == group).collect()
}

/// Case-insensitive substring match on label or description.
///
/// An empty (or whitespace-only) query matches every feature.
pub fn filter(query: &str) -> Vec<&'static Feature> {
    let needle = query.trim().to_lowercase();
    CATALOG
        .iter()
        .filter(|f| {
            needle.is_empty()
                || f.label.to_lowercase().contains(&needle)
                || f.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = all().iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_every_feature_has_operations() {
        for feature in all() {
            assert!(!feature.operations.is_empty(), "{} has no ops", feature.id);
        }
    }

    #[test]
    fn test_groups_cover_catalog_in_order() {
        let counts: Vec<usize> = FeatureGroup::ALL.iter().map(|g| group(*g).len()).collect();
        assert_eq!(counts, vec![5, 4, 4, 1]);

        let flattened: Vec<&str> = FeatureGroup::ALL
            .iter()
            .flat_map(|g| group(*g))
            .map(|f| f.id)
            .collect();
        let catalog: Vec<&str> = all().iter().map(|f| f.id).collect();
        assert_eq!(flattened, catalog);
    }

    #[test]
    fn test_find() {
        let feature = find("super-flight").unwrap();
        assert_eq!(
            feature.operations,
            &[Operation::Patch {
                offset: 0xA5C842,
                bytes: &[0xC7, 0x01, 0x00, 0x00, 0xC8, 0x42]
            }]
        );
        assert!(find("toggle-collapse").is_none());
    }

    #[test]
    fn test_filter() {
        assert_eq!(filter("").len(), all().len());
        let camera: Vec<&str> = filter("CAMERA").iter().map(|f| f.id).collect();
        assert!(camera.contains(&"disable-cam-snap"));
        assert!(camera.contains(&"first-person"));
        // matches description only
        let water: Vec<&str> = filter("underwater").iter().map(|f| f.id).collect();
        assert_eq!(water, vec!["infinite-breath"]);
        assert!(filter("nothing like this").is_empty());
    }
}
