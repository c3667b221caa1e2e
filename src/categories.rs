// 🏷️ Category Registry - static part categories with icon identifiers
//
// The registry is a fixed table built at compile time. It supplies the
// dropdown choices (in display order) and maps a category name to its icon.
// Unknown names never fail: they get the default icon.

use serde::Serialize;

/// Icon used for any category the registry does not know
pub const DEFAULT_ICON: &str = "fa-cube";

// ============================================================================
// CATEGORY ENTRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    /// Display name, also the value stored in a row
    pub name: &'static str,

    /// Icon identifier (Font Awesome class name)
    pub icon_id: &'static str,
}

const STANDARD_ENTRIES: &[CategoryEntry] = &[
    CategoryEntry { name: "Processor", icon_id: "fa-microchip" },
    CategoryEntry { name: "Motherboard", icon_id: "fa-server" },
    CategoryEntry { name: "Graphic Card", icon_id: "fa-gamepad" },
    CategoryEntry { name: "Memory (RAM)", icon_id: "fa-memory" },
    CategoryEntry { name: "SSD Drive", icon_id: "fa-hdd" },
    CategoryEntry { name: "Hard Disk (HDD)", icon_id: "fa-database" },
    CategoryEntry { name: "Power Supply", icon_id: "fa-plug" },
    CategoryEntry { name: "Cabinet", icon_id: "fa-box" },
    CategoryEntry { name: "Monitor", icon_id: "fa-desktop" },
    CategoryEntry { name: "CPU Cooler", icon_id: "fa-fan" },
    CategoryEntry { name: "Keyboard", icon_id: "fa-keyboard" },
    CategoryEntry { name: "Mouse", icon_id: "fa-mouse" },
    CategoryEntry { name: "Mousepad", icon_id: "fa-scroll" },
    CategoryEntry { name: "Headphones", icon_id: "fa-headphones" },
    CategoryEntry { name: "Speaker", icon_id: "fa-volume-up" },
    CategoryEntry { name: "Gaming Controller", icon_id: "fa-gamepad" },
    CategoryEntry { name: "UPS", icon_id: "fa-battery-full" },
    CategoryEntry { name: "Case Fans", icon_id: "fa-wind" },
    CategoryEntry { name: "Other", icon_id: "fa-cube" },
];

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

/// Registry of known part categories
///
/// Immutable after construction. Use [`CategoryRegistry::standard`] for the
/// built-in table shared by every component.
#[derive(Debug)]
pub struct CategoryRegistry {
    entries: &'static [CategoryEntry],
}

static STANDARD: CategoryRegistry = CategoryRegistry {
    entries: STANDARD_ENTRIES,
};

impl CategoryRegistry {
    /// The built-in registry
    pub fn standard() -> &'static CategoryRegistry {
        &STANDARD
    }

    /// Category names in display order
    pub fn list_categories(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> &'static [CategoryEntry] {
        self.entries
    }

    /// Icon for a category, or [`DEFAULT_ICON`] when unknown
    pub fn icon_for(&self, category: &str) -> &'static str {
        self.find(category).map(|e| e.icon_id).unwrap_or(DEFAULT_ICON)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.find(category).is_some()
    }

    /// First entry; new rows start with this category
    pub fn default_category(&self) -> &'static str {
        self.entries.first().map(|e| e.name).unwrap_or("Other")
    }

    /// Category after `category` in display order, wrapping around.
    /// Unknown names start over at the first entry.
    pub fn next_after(&self, category: &str) -> &'static str {
        match self.position(category) {
            Some(i) => self.entries[(i + 1) % self.entries.len()].name,
            None => self.default_category(),
        }
    }

    /// Category before `category` in display order, wrapping around
    pub fn previous_before(&self, category: &str) -> &'static str {
        match self.position(category) {
            Some(0) => self.entries[self.entries.len() - 1].name,
            Some(i) => self.entries[i - 1].name,
            None => self.default_category(),
        }
    }

    fn find(&self, category: &str) -> Option<&'static CategoryEntry> {
        self.entries.iter().find(|e| e.name == category)
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == category)
    }
}
