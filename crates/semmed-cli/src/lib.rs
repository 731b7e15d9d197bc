//! Library side of the `semmed` binary, split out so commands can be
//! exercised from tests.

pub mod cli;
pub mod commands;
pub mod logging;
