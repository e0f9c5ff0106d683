pub mod classify;
pub mod core;
pub mod gateway;
pub mod poll;
pub mod providers;
pub mod server;
pub mod transport;

pub use core::types::*;
pub use gateway::{MediaGateway, MediaGatewayBuilder};
