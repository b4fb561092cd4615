// Start of file: /src/utils/mod.rs

/*
    * HTTP plumbing shared by every route: global error mapping,
    * the JSON response envelope, and JSON helpers.
*/

pub mod error_handler;
pub mod response_handler;
pub mod utils;

// End of file: /src/utils/mod.rs
