pub mod redact;
pub mod size;
pub mod time;
