//! Record types produced by the extractors.
//!
//! Every record type implements [`Record`], which gives the extractor
//! pipeline the three things it needs beyond the data itself: an identity
//! key for merging, a field-wise `absorb` used by the record merger, and a
//! normalisation pass that may drop the record when its identity field ends
//! up empty.

pub mod types;

pub use types::{
    ContactInfo, ContentSection, FundingInfo, NewsItem, PageContent, PageImage, PeriodInfo,
    Project, ProjectDetail, Publication, ResearchGroup, Section, StaffMember, Subpage,
};

use serde::{Deserialize, Serialize};
use url::Url;

/// Record types known to the engine, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Sections,
    News,
    ResearchGroups,
    Publications,
    Staff,
    ContactInfo,
    Projects,
}

impl RecordKind {
    /// Every kind routed to a page by the orchestrator.
    pub const PAGE_KINDS: [RecordKind; 6] = [
        RecordKind::News,
        RecordKind::ResearchGroups,
        RecordKind::Publications,
        RecordKind::Staff,
        RecordKind::ContactInfo,
        RecordKind::Projects,
    ];

    /// Output name (`news.csv`, `staff.json`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::News => "news",
            Self::ResearchGroups => "research_groups",
            Self::Publications => "publications",
            Self::Staff => "staff",
            Self::ContactInfo => "contact_info",
            Self::Projects => "projects",
        }
    }

    /// Lowercase words that mark a section title or URL as belonging to
    /// this kind.
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Sections => &[],
            Self::News => &["news", "noticias", "actualidad"],
            Self::ResearchGroups => &["research", "investigacion", "investigación", "groups", "grupos"],
            Self::Publications => &["publications", "publicaciones"],
            Self::Staff => &["people", "staff", "personal", "team", "equipo"],
            Self::ContactInfo => &["contact", "contacto"],
            Self::Projects => &["projects", "proyectos"],
        }
    }
}

/// How the merger resolves two non-empty, differing scalar values for
/// the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarConflict {
    /// Keep the value from the higher-priority strategy (first seen on ties).
    #[default]
    PreferHigherPriority,
    /// Keep the longer value; equal lengths keep the higher-priority one.
    PreferLonger,
}

/// Where a document came from. Strategies resolve links against
/// `page_url`; section URLs are resolved against `base_url`.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub base_url: &'a Url,
    pub page_url: &'a Url,
}

/// Behaviour shared by every extracted record type.
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Key that recognises two partial records as the same entity.
    ///
    /// `None` when the identity field is missing; such candidates are
    /// discarded before merging.
    fn identity_key(&self) -> Option<String>;

    /// Widen `self` with the fields of `other` (a lower- or equal-priority
    /// partial for the same identity).
    fn absorb(&mut self, other: &Self, policy: ScalarConflict);

    /// Looser key shared by candidates that may describe the same entity
    /// even when their identity keys differ.
    fn weak_key(&self) -> Option<String> {
        None
    }

    /// `false` when `identity_key` fell back to the weak key.
    fn has_strong_identity(&self) -> bool {
        true
    }

    /// Normalise every field. Returns `None` when the identity field is
    /// empty afterwards.
    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self>;
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Merge one required text field.
pub(crate) fn merge_text(slot: &mut String, other: &str, policy: ScalarConflict) {
    if is_blank(other) {
        return;
    }
    let replace = is_blank(slot)
        || (policy == ScalarConflict::PreferLonger
            && other.trim().chars().count() > slot.trim().chars().count());
    if replace {
        *slot = other.to_string();
    }
}

/// Merge one optional text field.
pub(crate) fn merge_opt_text(slot: &mut Option<String>, other: &Option<String>, policy: ScalarConflict) {
    let Some(incoming) = other.as_deref().filter(|s| !is_blank(s)) else {
        return;
    };
    match slot {
        Some(current) if !is_blank(current) => merge_text(current, incoming, policy),
        _ => *slot = Some(incoming.to_string()),
    }
}

/// Fill an optional non-text field when it is still empty.
pub(crate) fn merge_opt<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(other);
    }
}

/// Append the values of `other` that `slot` does not already contain,
/// preserving order.
pub(crate) fn merge_list(slot: &mut Vec<String>, other: &[String]) {
    for item in other {
        let key = crate::normalizer::identity_text(item);
        if key.is_empty() {
            continue;
        }
        if !slot
            .iter()
            .any(|existing| crate::normalizer::identity_text(existing) == key)
        {
            slot.push(item.clone());
        }
    }
}
