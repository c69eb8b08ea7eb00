//! CSV front-end used by the `rosca` binary.

pub mod command_reader;
pub mod report_writer;
