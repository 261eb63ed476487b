pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod stories;

pub use routes::create_router;
