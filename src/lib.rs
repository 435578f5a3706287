pub mod reader;
pub mod session;
pub mod story;
