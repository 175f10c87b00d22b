//! Driven adapters implementing the domain ports.

pub mod http;
pub mod navigation;
pub mod storage;
