use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Longest title the `drinks.title` column accepts.
pub const MAX_TITLE_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    pub parts: u32,
}

/// Ordered ingredient list, persisted as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe(pub Vec<Ingredient>);

impl Recipe {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Recipe)
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }
}

impl From<Vec<Ingredient>> for Recipe {
    fn from(ingredients: Vec<Ingredient>) -> Self {
        Recipe(ingredients)
    }
}

/// Recipe as accepted from clients: a list, or a lone ingredient object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl From<RecipeInput> for Recipe {
    fn from(input: RecipeInput) -> Self {
        match input {
            RecipeInput::Many(ingredients) => Recipe(ingredients),
            RecipeInput::One(ingredient) => Recipe(vec![ingredient]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Recipe,
}

/// Raw `drinks` row before the recipe column is decoded.
#[derive(Debug, Clone, FromRow)]
pub struct DrinkRow {
    pub id: i32,
    pub title: String,
    pub recipe: String,
}

impl DrinkRow {
    pub fn decode(self) -> Result<Drink, serde_json::Error> {
        Ok(Drink {
            id: self.id,
            title: self.title,
            recipe: Recipe::decode(&self.recipe)?,
        })
    }
}

/// Fields of a partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct DrinkChanges {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl DrinkChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }
}

/// Title rules shared by create and update.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {} characters", MAX_TITLE_LEN));
    }
    Ok(())
}
