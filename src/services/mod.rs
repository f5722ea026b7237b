pub mod chain;
pub mod email;
pub mod pinning;
pub mod render;
