/*
[INPUT]:  Public API exports for the taskpad command-line front end
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point shared by the binary and its tests
[UPDATE]: When adding new modules or public exports
*/

pub mod commands;
pub mod config;
pub mod notices;

pub use config::CliConfig;
pub use notices::spawn_notice_printer;
