pub mod config;
pub mod error;
pub mod form;
pub mod images;
pub mod io;
pub mod library;
pub mod model;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;
