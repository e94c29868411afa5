pub mod core;
pub mod gui;
pub mod pipeline;
pub mod player;
