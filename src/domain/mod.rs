pub mod errors;
pub mod library;
pub mod ports;
pub mod ranking;
pub mod types;
pub mod validation;
