//! Runtime module: process lifecycle from boot to shutdown.

pub mod boot;
pub mod serve;
pub mod stop;
