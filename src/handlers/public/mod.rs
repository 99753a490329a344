// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Anonymous callers only ever see the short drink representation.

pub mod drinks;
pub mod status;
