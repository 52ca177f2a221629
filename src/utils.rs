pub mod id;
pub mod json;
pub mod logging;
pub mod time;
