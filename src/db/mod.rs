pub mod models;
pub mod repository;

#[cfg(test)]
pub mod test_utils;

pub use models::*;
pub use repository::*;
