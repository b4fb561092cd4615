// Start of file: /src/core/mod.rs

/*
* Application core: logging, HTTP server, initialization and lifecycle.
*/

pub mod application;
pub mod error;
pub mod faults;
pub mod lifecycle;
pub mod logging;
pub mod server;
pub mod signals;

// End of file: /src/core/mod.rs
