pub mod config;
pub mod duck;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod table;
pub mod transform;
