//! Item and recipe catalog.
//!
//! Loaded once from the extracted game-data JSON and treated as immutable
//! for the lifetime of the run. Items are keyed by hrid; recipes are keyed
//! by their output item's hrid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::types::ForgeError;

/// Category whose items can be produced from a recipe.
pub const EQUIPMENT_CATEGORY: &str = "/item_categories/equipment";

/// Craftable despite not being equipment.
pub const PHILOSOPHERS_MIRROR: &str = "/items/philosophers_mirror";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One (item, count) pair in an enhancement-cost list or recipe input list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCost {
    pub item: String,
    pub count: f64,
}

/// A single catalog item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemRecord {
    /// Stable identity, filled from the catalog map key on load.
    #[serde(skip)]
    pub hrid: String,
    pub name: String,
    /// Item level requirement ("item level" in the success formula).
    pub level: u32,
    pub category: String,
    /// NPC vendor price; 0 when the vendor does not deal in this item.
    pub sell_price: f64,
    pub sort_index: u32,
    /// Non-combat stats (enhancingSuccess, enhancingSpeed, ...).
    pub stats: HashMap<String, f64>,
    /// Per-attempt enhancement materials including the flat coin cost.
    /// Absent for items that cannot be enhanced.
    pub enhancement_costs: Option<Vec<MaterialCost>>,
    /// Item-specific protection candidates advertised by the record.
    pub protection_items: Vec<String>,
}

impl ItemRecord {
    /// Whether the pricing layer may try to price this item from a recipe.
    pub fn is_craftable(&self) -> bool {
        self.category == EQUIPMENT_CATEGORY || self.hrid == PHILOSOPHERS_MIRROR
    }
}

/// A production recipe, keyed externally by its output item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeRecord {
    pub inputs: Vec<MaterialCost>,
    /// Required base component. Never discounted by crafting reductions.
    pub upgrade: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    items: HashMap<String, ItemRecord>,
    #[serde(default)]
    recipes: HashMap<String, RecipeRecord>,
}

/// The immutable item/recipe catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, ItemRecord>,
    recipes: HashMap<String, RecipeRecord>,
}

impl Catalog {
    /// Build a catalog from already-constructed records (fixtures, tests).
    pub fn new(items: Vec<ItemRecord>, recipes: HashMap<String, RecipeRecord>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.hrid.clone(), item))
            .collect();
        Catalog { items, recipes }
    }

    /// Load the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))
    }

    /// Parse the catalog from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json).context("Malformed catalog JSON")?;
        if raw.items.is_empty() {
            return Err(ForgeError::Catalog("catalog contains no items".to_string()).into());
        }
        let items = raw
            .items
            .into_iter()
            .map(|(hrid, mut item)| {
                item.hrid = hrid.clone();
                (hrid, item)
            })
            .collect();
        Ok(Catalog {
            items,
            recipes: raw.recipes,
        })
    }

    pub fn item(&self, hrid: &str) -> Option<&ItemRecord> {
        self.items.get(hrid)
    }

    /// The recipe producing this item, if one exists.
    pub fn recipe_for(&self, hrid: &str) -> Option<&RecipeRecord> {
        self.recipes.get(hrid)
    }

    /// A non-combat stat of an item; 0 when the item or stat is absent.
    pub fn stat(&self, hrid: &str, stat: &str) -> f64 {
        self.items
            .get(hrid)
            .and_then(|item| item.stats.get(stat))
            .copied()
            .unwrap_or(0.0)
    }

    /// All items that can be enhanced, in catalog sort order.
    pub fn enhanceable_items(&self) -> Vec<&ItemRecord> {
        let mut items: Vec<&ItemRecord> = self
            .items
            .values()
            .filter(|item| item.enhancement_costs.is_some())
            .collect();
        items.sort_by(|a, b| {
            a.sort_index
                .cmp(&b.sort_index)
                .then_with(|| a.hrid.cmp(&b.hrid))
        });
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
