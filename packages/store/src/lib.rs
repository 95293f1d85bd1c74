//! # Store crate — platform-neutral diary domain for ETHOSLOG
//!
//! Everything in here compiles for both the server and the WASM client: the
//! records exchanged through server functions, the validation and text helpers
//! the UI and the server share, and the [`Journal`] service that saves an entry
//! and then analyzes it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `DiaryEntry`, `DiaryDraft`, `UserProfile`, `LocationItem`, `Category` |
//! | [`journal`] | `DiaryStore` / `Analyzer` traits, `Journal`, `AnalysisJob`, `AnalysisTracker` |
//! | [`text`] | Tag extraction, HTML → text, analysis bullet splitting |
//! | [`validation`] | Profile form rules and username derivation |

pub mod journal;
pub mod models;
pub mod text;
pub mod validation;

mod memory;
pub use memory::MemoryStore;

pub use journal::{
    AnalysisError, AnalysisJob, AnalysisTracker, Analyzer, DiaryStore, Journal, StoreError,
};
pub use models::{AnalysisStatus, Category, DiaryDraft, DiaryEntry, LocationItem, ProfileUpdate, UserProfile};
pub use text::AnalysisPoint;
pub use validation::ValidationError;
