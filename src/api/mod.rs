pub mod format;

pub use format::{long, short, LongDrink, ShortDrink};
