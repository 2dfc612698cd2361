mod client;
mod credentials;
mod stream;

pub use client::*;
pub use credentials::*;
pub use stream::*;
