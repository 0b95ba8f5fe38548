//! Extracted menu structure
//!
//! Shape of the vision model's structured output contract:
//! `{restaurant_name, sections:[{name, dishes:[{name, description, price, dietary}]}]}`

use serde::{Deserialize, Serialize};

/// A parsed restaurant menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub sections: Vec<MenuSection>,
}

/// One named section of the menu (e.g. "Starters")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSection {
    pub name: String,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

/// A single dish entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub dietary: Vec<String>,
}

impl Menu {
    /// Flatten the menu into dish names, de-duplicated by exact string,
    /// first-seen order. No case normalization at this layer; the image
    /// cache applies its own normalized key.
    pub fn dish_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for section in &self.sections {
            for dish in &section.dishes {
                if !dish.name.is_empty() && seen.insert(dish.name.clone()) {
                    names.push(dish.name.clone());
                }
            }
        }
        names
    }
}
