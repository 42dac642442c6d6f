//! Item catalog domain module.
//!
//! Owns `InventoryItem` identity and static attributes (SKU, reorder
//! policy). Pure domain logic: registration, update, and deactivation are
//! expressed as state transitions returned by value; persistence and SKU
//! uniqueness enforcement live behind the store.

pub mod item;

pub use item::{InventoryItem, ItemSpec, ItemUpdate};
