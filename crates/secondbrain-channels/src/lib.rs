//! Channel implementations for the SecondBrain loops.

pub mod cli;

pub use cli::CliChannel;
