pub mod models;
pub mod oracle;
pub mod pareto;
pub mod problem;
