pub mod config;
pub mod permissions;
pub mod session;

pub use config::*;
pub use permissions::*;
pub use session::*;
