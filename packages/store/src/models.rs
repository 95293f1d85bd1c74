//! # Domain models for diary entries and user profiles
//!
//! Defines the records that cross the server/client boundary via Dioxus server
//! functions. Every type here is `Serialize + Deserialize` and keeps identifiers as
//! strings so it compiles unchanged for WASM.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`DiaryEntry`] | A persisted journal record, including its optional AI analysis and soft-delete timestamp. |
//! | [`DiaryDraft`] | The editable part of an entry (title, content, category, tags) submitted on create/update. |
//! | [`UserProfile`] | Public profile data attached to an account: username, avatar, bio, location. |
//! | [`ProfileUpdate`] | The profile form as submitted by the user, before validation. |
//! | [`LocationItem`] | One normalised geocoding result for the location autocomplete. |
//! | [`AnalysisStatus`] | Which entries are being analyzed and which analyses just failed. |
//!
//! [`Category`] enumerates the three categories offered by the editor. The column
//! itself is free text, so unknown values read back from storage are preserved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::{extract_tags, normalize_tag};

/// Title used when the author leaves the title field blank.
pub const UNTITLED: &str = "无标题";

/// A journal record as stored in the `diaries` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Markdown body (older entries may contain HTML).
    pub content: String,
    /// Free-text reflection produced by the analyzer, `None` until it succeeds.
    pub analysis: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Set by a soft delete; deleted entries never show up in listings.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiaryEntry {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Editable fields of a diary entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaryDraft {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl DiaryDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Clean up user input before it is persisted.
    ///
    /// A blank title becomes [`UNTITLED`] and a blank category becomes `None`.
    /// `#hashtags` written in the content join the explicit tags after them. Tags
    /// lose their leading `#`, empty ones are dropped and duplicates removed while
    /// keeping the first occurrence.
    pub fn normalized(self) -> Self {
        let title = match self.title.trim() {
            "" => UNTITLED.to_string(),
            t => t.to_string(),
        };

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        let inline = extract_tags(&self.content);
        let candidates = self.tags.iter().chain(inline.iter());
        for tag in candidates.filter_map(|t| normalize_tag(t)) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Self {
            title,
            content: self.content,
            category,
            tags,
        }
    }
}

/// Analysis state of a user's entries, as polled by the list and detail views.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    /// Entries with an analysis still running.
    pub analyzing: Vec<String>,
    /// Entries whose last analysis failed since the previous poll.
    pub failed: Vec<String>,
}

/// Categories offered by the diary editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Review of the day ("复盘").
    #[default]
    Review,
    /// Something learned ("知识").
    Knowledge,
    /// An idea ("灵感").
    Inspiration,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Review, Category::Knowledge, Category::Inspiration];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Review => "复盘",
            Category::Knowledge => "知识",
            Category::Inspiration => "灵感",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public profile attached to an account, keyed by the user id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile form contents as submitted from the profile page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// A single place returned by the location search proxy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationItem {
    pub id: String,
    pub title: String,
    pub address: String,
    pub province: String,
    pub city: String,
    pub district: String,
}

impl LocationItem {
    /// Human-readable label used by the autocomplete, e.g. "浙江省 杭州市 西湖区".
    pub fn region_label(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        for part in [&self.province, &self.city, &self.district] {
            // Municipalities repeat the province as the city.
            if !part.is_empty() && parts.last() != Some(&part.as_str()) {
                parts.push(part.as_str());
            }
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_becomes_untitled() {
        let draft = DiaryDraft::new("   ", "body").normalized();
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.content, "body");
    }

    #[test]
    fn test_tags_are_cleaned_and_deduplicated() {
        let draft = DiaryDraft::new("t", "c")
            .with_tags(["#work", "work", " ", "#", "life", "#life"])
            .normalized();
        assert_eq!(draft.tags, vec!["work", "life"]);
    }

    #[test]
    fn test_hashtags_in_content_become_tags() {
        let draft = DiaryDraft::new("t", "# 标题\n今天 #跑步 了，心情#不错 #work")
            .with_tags(["work"])
            .normalized();
        assert_eq!(draft.tags, vec!["work", "跑步", "不错"]);
    }

    #[test]
    fn test_blank_category_is_dropped() {
        let draft = DiaryDraft::new("t", "c").with_category("  ").normalized();
        assert!(draft.category.is_none());

        let draft = DiaryDraft::new("t", "c").with_category(" 灵感 ").normalized();
        assert_eq!(draft.category.as_deref(), Some("灵感"));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("知识"), Some(Category::Knowledge));
        assert_eq!(Category::parse("unknown"), None);
        assert_eq!(Category::default().as_str(), "复盘");
    }

    #[test]
    fn test_region_label_skips_repeated_municipality() {
        let item = LocationItem {
            province: "北京市".into(),
            city: "北京市".into(),
            district: "海淀区".into(),
            ..LocationItem::default()
        };
        assert_eq!(item.region_label(), "北京市 海淀区");
    }
}
