pub mod db;
mod files;
pub mod models;
mod shares;
mod tables;

pub use db::{Database, DatabaseError, PurgeStats};
pub use tables::*;
