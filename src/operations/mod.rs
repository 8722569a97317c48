pub mod add;
pub mod advise;
pub mod dashboard;
pub mod remove;
pub mod report;
pub mod stats;
