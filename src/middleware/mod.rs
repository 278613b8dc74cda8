pub mod client_request;

pub use client_request::{ClientPreprocess, NewClient};
