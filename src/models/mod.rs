pub mod client;
pub mod document;
pub mod helpchat;
pub mod service;
pub mod user;

pub use client::*;
pub use document::*;
pub use helpchat::*;
pub use service::*;
pub use user::*;
