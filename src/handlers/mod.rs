// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token with a per-route permission)
pub mod public;
pub mod protected;
