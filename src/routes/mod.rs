pub mod booking;
pub mod health;
pub mod review;
pub mod service;
pub mod user;
