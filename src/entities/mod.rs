pub mod prelude;

pub mod astronauts;
pub mod users;
