pub mod profile;
pub mod server;
pub mod storage;
