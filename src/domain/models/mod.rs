mod backend;
mod error;
mod event;
mod message;
mod role;
mod session;

pub use backend::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use role::*;
pub use session::*;
