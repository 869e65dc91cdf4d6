pub mod checker;
pub mod driver;
pub mod fitness;
pub mod models;
pub mod optimizer;
pub mod particle;
pub mod tune;
