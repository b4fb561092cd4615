/*
* Liveness and database connectivity endpoints.
*/

pub mod handler;
pub mod routes;

pub use routes::health_routes;
