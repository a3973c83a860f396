pub mod config;
pub mod controller;
pub mod culling;
pub mod evaluator;
pub mod evolve;
pub mod runner;
pub mod stats;
pub mod trainer;
pub mod util;
