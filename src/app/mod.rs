pub mod bootstrap;
pub mod controller;

pub use bootstrap::run;
pub use controller::{parse_command, AppController, Command, Reply};
