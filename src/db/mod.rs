pub mod connection;
pub mod slot;
