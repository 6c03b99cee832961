pub mod content;
pub mod formats;
pub mod fs;
pub mod storage;
