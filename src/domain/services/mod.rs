mod catalog;
mod controller;
mod sessions;
mod timeline;

pub use catalog::*;
pub use controller::*;
pub use sessions::*;
pub use timeline::*;
