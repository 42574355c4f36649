pub mod auth;
pub mod cookies;
pub mod pages;
pub mod portal;
pub mod relay;
