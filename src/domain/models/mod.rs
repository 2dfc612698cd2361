mod document;
mod event;
mod frame;
mod message;
mod role;
mod session;
mod user;

pub use document::*;
pub use event::*;
pub use frame::*;
pub use message::*;
pub use role::*;
pub use session::*;
pub use user::*;
