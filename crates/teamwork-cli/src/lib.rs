// Library side of the teamwork binary, so the drivers can be tested
// against mock model clients.

pub mod cli;
pub mod demos;

pub use cli::{Cli, Demo};
