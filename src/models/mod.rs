pub mod common;
pub mod draw;
pub mod participant;
pub mod user;
pub mod winner;

pub use common::*;
pub use draw::*;
pub use participant::*;
pub use user::*;
pub use winner::*;
