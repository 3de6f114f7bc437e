pub mod auth;
pub mod place;
pub mod proposal;
pub mod reservation;
