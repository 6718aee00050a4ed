pub mod api;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod controller;
pub mod filter;
pub mod form;
pub mod normalizer;
pub mod notify;
pub mod session;
