pub mod audit;
pub mod overrides;
pub mod query;
pub mod workspace;
