/*
[INPUT]:  Interactive user input
[OUTPUT]: Binary-only helpers (config bootstrap)
[POS]:    CLI layer - module wiring for the binary
[UPDATE]: When adding interactive flows
*/

pub mod init;
