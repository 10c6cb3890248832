// Stat-field schemas: which per-match stats are extracted and averaged.

use serde::{Deserialize, Serialize};

/// A single named numeric stat as it appears in the upstream `player_stats`
/// object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatField {
    pub name: String,
    /// Percentage-typed fields are normalised to a 0-100 scale on extraction.
    pub percentage: bool,
}

/// Which built-in schema a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    #[default]
    Basic,
    Full,
}

impl SchemaMode {
    pub fn schema(self) -> StatSchema {
        match self {
            SchemaMode::Basic => StatSchema::basic(),
            SchemaMode::Full => StatSchema::full(),
        }
    }
}

/// Ordered set of stat fields for one aggregation mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatSchema {
    name: String,
    fields: Vec<StatField>,
}

const BASIC_FIELDS: &[&str] = &[
    "Kills",
    "Assists",
    "Deaths",
    "K/D Ratio",
    "K/R Ratio",
    "Headshots",
    "Headshots %",
    "Triple Kills",
    "Quadro Kills",
    "Penta Kills",
    "MVPs",
];

const FULL_FIELDS: &[&str] = &[
    // Combat
    "Kills",
    "Assists",
    "Deaths",
    "ADR",
    "K/D Ratio",
    "K/R Ratio",
    "Damage",
    // Headshots
    "Headshots",
    "Headshots %",
    // Multi-kills
    "Double Kills",
    "Triple Kills",
    "Quadro Kills",
    "Penta Kills",
    // Flashes
    "Flash Count",
    "Enemies Flashed",
    "Flash Successes",
    "Flashes per Round in a Match",
    "Enemies Flashed per Round in a Match",
    "Flash Success Rate per Match",
    // Utility
    "Utility Count",
    "Utility Damage",
    "Utility Successes",
    "Utility Usage per Round",
    "Utility Success Rate per Match",
    "Utility Damage per Round in a Match",
    "Utility Damage Success Rate per Match",
    "Utility Enemies",
    // Clutches
    "Clutch Kills",
    "1v1Count",
    "1v1Wins",
    "Match 1v1 Win Rate",
    "1v2Count",
    "1v2Wins",
    "Match 1v2 Win Rate",
    // Weapons
    "Pistol Kills",
    "Sniper Kills",
    "Sniper Kill Rate per Round",
    "Sniper Kill Rate per Match",
    "Knife Kills",
    "Zeus Kills",
    // Entries
    "First Kills",
    "Entry Count",
    "Entry Wins",
    "Match Entry Success Rate",
    "Match Entry Rate",
    // Other
    "MVPs",
    "Result",
];

/// Full-mode fields the upstream sometimes reports as a 0-1 fraction.
const FULL_PERCENTAGE_FIELDS: &[&str] = &[
    "Match Entry Rate",
    "Match Entry Success Rate",
    "Match 1v1 Win Rate",
    "Match 1v2 Win Rate",
    "Sniper Kill Rate per Match",
    "Flash Success Rate per Match",
    "Utility Success Rate per Match",
    "Utility Damage Success Rate per Match",
];

impl StatSchema {
    /// Core combat stats: kills, assists, deaths, ratios, headshots,
    /// multi-kills and MVPs. No field is percentage-normalised.
    pub fn basic() -> Self {
        Self::from_names("basic", BASIC_FIELDS, &[])
    }

    /// Everything in [`StatSchema::basic`] plus damage, flash, utility,
    /// clutch, weapon and entry statistics.
    pub fn full() -> Self {
        Self::from_names("full", FULL_FIELDS, FULL_PERCENTAGE_FIELDS)
    }

    /// Build a schema from explicit fields. Duplicate names keep their first
    /// occurrence so a record never carries the same stat twice.
    pub fn custom(name: impl Into<String>, fields: impl IntoIterator<Item = StatField>) -> Self {
        let mut unique: Vec<StatField> = Vec::new();
        for field in fields {
            if !unique.iter().any(|f| f.name == field.name) {
                unique.push(field);
            }
        }
        Self {
            name: name.into(),
            fields: unique,
        }
    }

    fn from_names(name: &str, names: &[&str], percentage: &[&str]) -> Self {
        Self::custom(
            name,
            names.iter().map(|n| StatField {
                name: (*n).to_owned(),
                percentage: percentage.contains(n),
            }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[StatField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Unknown names are never percentage-typed.
    pub fn is_percentage(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name && f.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_schema_keeps_declared_order() {
        let schema = StatSchema::basic();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names.first(), Some(&"Kills"));
        assert_eq!(names.last(), Some(&"MVPs"));
        assert_eq!(schema.len(), 11);
        assert!(schema.fields().iter().all(|f| !f.percentage));
    }

    #[test]
    fn full_schema_is_a_superset_of_basic() {
        let full = StatSchema::full();
        for name in StatSchema::basic().field_names() {
            assert!(full.position(name).is_some(), "full schema is missing {name}");
        }
        assert_eq!(full.len(), FULL_FIELDS.len());
    }

    #[test]
    fn full_schema_marks_rate_fields_as_percentages() {
        let full = StatSchema::full();
        assert!(full.is_percentage("Match Entry Rate"));
        assert!(full.is_percentage("Utility Damage Success Rate per Match"));
        assert!(!full.is_percentage("Headshots %"));
        assert!(!full.is_percentage("Kills"));
        assert!(!full.is_percentage("Not A Field"));
    }

    #[test]
    fn custom_schema_drops_duplicate_names() {
        let schema = StatSchema::custom(
            "dupes",
            [
                StatField { name: "Kills".into(), percentage: false },
                StatField { name: "Kills".into(), percentage: true },
            ],
        );
        assert_eq!(schema.len(), 1);
        assert!(!schema.is_percentage("Kills"));
    }

    #[test]
    fn schema_mode_maps_to_builtin_schemas() {
        assert_eq!(SchemaMode::Basic.schema().name(), "basic");
        assert_eq!(SchemaMode::Full.schema().name(), "full");
        assert_eq!(SchemaMode::default(), SchemaMode::Basic);
    }
}
