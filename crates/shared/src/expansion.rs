// Expansion selection
// The emulator speaks two client builds; nearly every wire difference
// between them is funneled through this enum.

/// Client flavor served by the world side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Build 5875 (1.12.1)
    Vanilla,
    /// Build 8606 (2.4.3)
    Tbc,
}

impl Expansion {
    /// Client build number the flavor corresponds to
    pub fn build(self) -> u16 {
        match self {
            Expansion::Vanilla => 5875,
            Expansion::Tbc => 8606,
        }
    }

    /// Parse a config value ("vanilla" / "tbc", or a build number)
    pub fn from_config(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "vanilla" | "classic" | "5875" | "1.12.1" => Some(Expansion::Vanilla),
            "tbc" | "8606" | "2.4.3" => Some(Expansion::Tbc),
            _ => None,
        }
    }
}

impl Default for Expansion {
    fn default() -> Self {
        Expansion::Vanilla
    }
}
