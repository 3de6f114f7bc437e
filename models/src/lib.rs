//! Database model definitions

#[macro_use]
extern crate tracing;

mod notification;
mod pagination;
mod place;
mod profile;
mod proposal;
mod reservation;

pub mod schema;

pub use notification::*;
pub use pagination::*;
pub use place::*;
pub use profile::*;
pub use proposal::*;
pub use reservation::*;
