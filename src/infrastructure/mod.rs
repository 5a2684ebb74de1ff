//! Infrastructure layer: concrete implementations of the domain seams.

pub mod gateway;
pub mod logging;
pub mod notify;
pub mod session;
pub mod store;
