//! Portuguese step bindings

pub mod cart;
pub mod home;
pub mod search_results;
