pub mod catalog;
pub mod deals;
pub mod health;
