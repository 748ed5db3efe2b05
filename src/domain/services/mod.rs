mod controller;
pub mod markdown;
mod sessions;

pub use controller::*;
pub use sessions::*;
