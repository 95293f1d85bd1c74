//! # Database module — PostgreSQL pool, diary store and profile queries
//!
//! Entirely gated behind `#[cfg(feature = "server")]` so that client (WASM)
//! builds never pull in SQLx or Tokio networking code.
//!
//! - [`get_pool`] — lazy process-wide `&'static PgPool` (`tokio::sync::OnceCell`),
//!   URL taken from [`crate::settings`].
//! - [`PgDiaryStore`] — [`store::DiaryStore`] over the `diaries` table.
//! - [`profiles`] — reads and upserts of `user_profiles`.
//! - [`users`] — account inserts that report duplicate emails as `None`.
//!
//! Migrations live in `packages/api/migrations` and are run by the web server
//! at startup.

#[cfg(feature = "server")]
mod diaries;
#[cfg(feature = "server")]
mod pool;
#[cfg(feature = "server")]
pub mod profiles;
#[cfg(feature = "server")]
pub mod users;

#[cfg(feature = "server")]
pub use diaries::PgDiaryStore;
#[cfg(feature = "server")]
pub use pool::get_pool;
