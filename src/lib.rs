pub mod configuration;
pub mod domain;
pub mod output;
pub mod parsing;
pub mod pipeline;
pub mod resilience;
pub mod routes;
pub mod services;
pub mod startup;
