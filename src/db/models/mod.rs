//! Database models, one file per table.

pub mod access_grant;
pub mod note;
pub mod shared_setting;
pub mod user;

pub use self::access_grant::*;
pub use self::note::*;
pub use self::shared_setting::*;
pub use self::user::*;
