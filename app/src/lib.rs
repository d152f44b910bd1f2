pub mod account;
pub mod allocation;
pub mod catalog;
pub mod credits;
pub mod database;
pub mod deduction;
pub mod generation;
pub mod store;
