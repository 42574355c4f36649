pub mod storage;
pub mod store;

pub use storage::{FileTokenStorage, TokenStorage};
pub use store::SessionStore;
