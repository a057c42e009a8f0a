pub mod config;
pub mod export;
pub mod plan;
pub mod subjects;
pub mod techniques;
pub mod tips;
