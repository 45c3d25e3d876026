pub mod api;
pub mod identity;

pub use api::*;
pub use identity::*;
