//! Capability negotiation between this client and the server

pub mod client;
pub mod server;

pub use client::{ClientCapabilities, ClientPlatform};
pub use server::{Feature, ServerCapabilities, ServerVersion};
