pub mod account;
pub mod actor;
pub mod appointment;
pub mod enums;
pub mod notification;

pub use account::*;
pub use actor::*;
pub use appointment::*;
pub use enums::*;
pub use notification::*;
