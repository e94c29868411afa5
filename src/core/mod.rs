pub mod config;
pub mod session;
pub mod source;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use session::*;
pub use source::*;
