pub mod drink;

pub use drink::{validate_title, Drink, DrinkChanges, DrinkRow, Ingredient, Recipe, RecipeInput};
