pub mod config;
pub mod data;
pub mod engine;
pub mod fetch;
pub mod history;
pub mod model;
pub mod notify;
pub mod run;
