pub mod stats;
pub mod transaction;
