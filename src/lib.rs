// Training core. The terminal front-end in main.rs, the benches and the
// integration tests all build on these modules.

pub mod config;
pub mod engine;
pub mod generator;
pub mod keyboard;
pub mod session;
pub mod store;
pub mod trace_init;
