pub mod errors;
pub mod observability;
pub mod page;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::run;
