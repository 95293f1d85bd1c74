//! Records exchanged with the frontends.
//!
//! Diary and profile records live in the `store` crate and are re-exported here
//! next to the account types.

mod user;

#[cfg(feature = "server")]
pub use user::User;
pub use user::UserInfo;

pub use store::{AnalysisStatus, DiaryEntry, LocationItem, UserProfile};
