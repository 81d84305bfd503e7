pub mod export;
pub mod targets;
