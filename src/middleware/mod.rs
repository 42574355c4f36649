pub mod guard;
pub mod security;

pub use security::SecurityHeaders;
