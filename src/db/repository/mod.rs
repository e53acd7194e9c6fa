//! Repository layer: entity-scoped database operations over a `Connection`.

pub mod account;
pub mod appointment;

pub use account::*;
pub use appointment::*;
