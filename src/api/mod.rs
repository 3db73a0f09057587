pub mod auth;
pub mod handlers;
pub mod response;
pub mod routes;
#[cfg(test)]
mod tests;

pub use routes::create_router;
