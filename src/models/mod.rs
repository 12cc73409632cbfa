pub mod astronaut;
pub mod user;

pub use astronaut::{Astronaut, AstronautUpdate};
pub use user::{NewUser, PasswordReset, Role, User, UserUpdate};
