//! Conversion between records and wire entities.

mod from_wire;
mod hooks;
mod to_wire;

pub use from_wire::RecordMaterializer;
pub use hooks::{MaterializeHooks, WireSource};
pub use to_wire::{related_records, EntityMaterializer};
