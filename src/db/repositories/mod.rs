pub mod astronaut;
pub mod user;
