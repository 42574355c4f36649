pub mod auth_types;
pub mod principal;
