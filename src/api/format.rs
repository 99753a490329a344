//! Response projections of a drink.
//!
//! `short` is safe for anonymous callers and exposes only ingredient colors;
//! `long` carries the full recipe for authenticated staff.

use serde::Serialize;

use crate::database::models::Drink;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongIngredient {
    pub color: String,
    pub name: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongDrink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<LongIngredient>,
}

pub fn short(drink: &Drink) -> ShortDrink {
    ShortDrink {
        id: drink.id,
        title: drink.title.clone(),
        recipe: drink
            .recipe
            .ingredients()
            .iter()
            .map(|i| ShortIngredient {
                color: i.color.clone(),
            })
            .collect(),
    }
}

pub fn long(drink: &Drink) -> LongDrink {
    LongDrink {
        id: drink.id,
        title: drink.title.clone(),
        recipe: drink
            .recipe
            .ingredients()
            .iter()
            .map(|i| LongIngredient {
                color: i.color.clone(),
                name: i.name.clone(),
                parts: i.parts,
            })
            .collect(),
    }
}
