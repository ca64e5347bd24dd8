//! Core data models for the recipe explorer
//!
//! This module contains the recipe records shared by the API client, the cache,
//! the favorites file and the UI, plus the clients that produce them.

pub mod api;
pub mod favorites;

pub use api::{ApiError, RecipeClient};
pub use favorites::FavoritesStore;

use serde::{Deserialize, Serialize};

/// One line of a recipe's ingredient list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name, e.g. "Chicken Thighs"
    pub name: String,
    /// Free-form quantity, e.g. "2 tbs"
    #[serde(default)]
    pub measure: Option<String>,
}

impl Ingredient {
    /// Formats as "measure name", or just the name when there is no measure
    pub fn display(&self) -> String {
        match &self.measure {
            Some(measure) => format!("{} {}", measure, self.name),
            None => self.name.clone(),
        }
    }
}

/// A recipe as returned by the API, normalised
///
/// Listing endpoints (ingredient and category filters) only return the id,
/// name and thumbnail; such records are "partial" and need a lookup by id
/// before they can be shown in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier assigned by the API
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Cuisine, e.g. "Italian"
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Image URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Video URL
    #[serde(default)]
    pub youtube: Option<String>,
    /// Original recipe page
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    /// Creates a partial recipe with only an id and a name
    pub fn summary(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            area: None,
            instructions: None,
            thumbnail: None,
            tags: Vec::new(),
            youtube: None,
            source: None,
            ingredients: Vec::new(),
        }
    }

    /// True when the record came from a listing endpoint and lacks details
    pub fn is_partial(&self) -> bool {
        self.instructions.is_none() && self.ingredients.is_empty()
    }

    /// "Category · Area" subtitle, empty if neither is known
    pub fn subtitle(&self) -> String {
        [self.category.as_deref(), self.area.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ")
    }

    /// Instructions split into non-empty steps
    pub fn steps(&self) -> Vec<&str> {
        self.instructions
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Removes later recipes whose id was already seen, keeping the first occurrence
pub fn dedup_by_id(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen = std::collections::HashSet::new();
    recipes
        .into_iter()
        .filter(|recipe| seen.insert(recipe.id.clone()))
        .collect()
}
