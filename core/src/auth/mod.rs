//! Session, login throttling and authorization.

pub mod permissions;
pub mod session;
pub mod storage;
pub mod throttle;

pub use permissions::{check_permission, has_any_permission, Action, Area, Permission, Role};
pub use session::Session;
pub use storage::{MemoryStorage, Storage};
pub use throttle::{LoginBlock, LoginThrottle};
