pub mod client;
pub mod data;
pub mod endpoints;

pub use data::BreakdownError;
