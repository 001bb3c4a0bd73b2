mod account;
mod audit;
mod permission;
mod session;

pub use account::*;
pub use audit::*;
pub use permission::*;
pub use session::*;
