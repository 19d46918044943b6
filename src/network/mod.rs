pub mod backoff;
pub mod client;
pub mod transport;

pub use client::SessionClient;
