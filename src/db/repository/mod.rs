pub mod access_grant;
pub mod note;
pub mod shared_setting;
pub mod user;

pub use access_grant::AccessGrantRepository;
pub use note::NoteRepository;
pub use shared_setting::SharedSettingRepository;
pub use user::UserRepository;
