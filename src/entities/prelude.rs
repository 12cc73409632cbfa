pub use super::astronauts::Entity as Astronauts;
pub use super::users::Entity as Users;
