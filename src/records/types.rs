//! Record structs in output field order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    merge_list, merge_opt, merge_opt_text, merge_text, PageContext, Record, RecordKind,
    ScalarConflict,
};
use crate::normalizer::{
    collapse_whitespace, identity_text, normalize_date, normalize_email, normalize_optional_text,
    normalize_phone, normalize_text, normalize_url, slugify,
};
use crate::utils::normalize_url_key;

fn key_of(raw: &str) -> Option<String> {
    let key = identity_text(raw);
    (!key.is_empty()).then_some(key)
}

fn opt_url(raw: Option<&str>, ctx: &PageContext<'_>) -> Option<String> {
    raw.and_then(|u| normalize_url(u, ctx.page_url))
}

/// A top-level site section discovered from the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub url: String,
    pub section_id: String,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            section_id: slugify(&title),
            title,
            url: url.into(),
        }
    }
}

impl Record for Section {
    const KIND: RecordKind = RecordKind::Sections;

    fn identity_key(&self) -> Option<String> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        Some(normalize_url_key(url).unwrap_or_else(|_| url.to_string()))
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.title, &other.title, policy);
        if self.section_id.trim().is_empty() {
            self.section_id = slugify(&self.title);
        }
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let title = normalize_text(&self.title);
        let url = normalize_url(&self.url, ctx.base_url)?;
        if title.is_empty() {
            return None;
        }
        let section_id = slugify(&title);
        Some(Self {
            title,
            url,
            section_id,
        })
    }
}

/// One news entry.
///
/// `date` is ISO-8601 when the source text parsed, otherwise the source
/// text itself; `date_text` always keeps what the page said.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub date: Option<String>,
    pub date_text: Option<String>,
    pub content: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl Record for NewsItem {
    const KIND: RecordKind = RecordKind::News;

    fn identity_key(&self) -> Option<String> {
        key_of(&self.title)
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.title, &other.title, policy);
        merge_opt_text(&mut self.date, &other.date, policy);
        merge_opt_text(&mut self.date_text, &other.date_text, policy);
        merge_text(&mut self.content, &other.content, policy);
        merge_opt_text(&mut self.url, &other.url, policy);
        merge_opt_text(&mut self.image_url, &other.image_url, policy);
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let title = normalize_text(&self.title);
        if title.is_empty() {
            return None;
        }
        let raw_date = self
            .date_text
            .as_deref()
            .or(self.date.as_deref())
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty());
        Some(Self {
            title,
            date: raw_date.as_deref().and_then(normalize_date),
            date_text: raw_date,
            content: normalize_text(&self.content),
            url: opt_url(self.url.as_deref(), ctx),
            image_url: opt_url(self.image_url.as_deref(), ctx),
        })
    }
}

/// A research group with its member list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchGroup {
    pub name: String,
    pub description: String,
    pub researchers: Vec<String>,
    pub researchers_text: String,
}

impl Record for ResearchGroup {
    const KIND: RecordKind = RecordKind::ResearchGroups;

    fn identity_key(&self) -> Option<String> {
        key_of(&self.name)
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.name, &other.name, policy);
        merge_text(&mut self.description, &other.description, policy);
        let derived = !self.researchers.is_empty()
            && self.researchers_text == self.researchers.join(", ");
        merge_list(&mut self.researchers, &other.researchers);
        if derived {
            self.researchers_text = self.researchers.join(", ");
        } else {
            merge_text(&mut self.researchers_text, &other.researchers_text, policy);
        }
    }

    fn normalize(self, _ctx: &PageContext<'_>) -> Option<Self> {
        let name = normalize_text(&self.name);
        if name.is_empty() {
            return None;
        }
        let mut researchers = Vec::with_capacity(self.researchers.len());
        let cleaned: Vec<String> = self
            .researchers
            .iter()
            .map(|r| normalize_text(r))
            .filter(|r| !r.is_empty())
            .collect();
        merge_list(&mut researchers, &cleaned);

        let mut researchers_text = normalize_text(&self.researchers_text);
        if researchers_text.is_empty() {
            researchers_text = researchers.join(", ");
        }
        Some(Self {
            name,
            description: normalize_text(&self.description),
            researchers,
            researchers_text,
        })
    }
}

/// A bibliographic entry. `full_text` keeps the verbatim citation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub authors: String,
    pub title: String,
    pub venue: String,
    pub year: Option<u16>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub full_text: String,
}

const MIN_PUBLICATION_YEAR: u16 = 1900;
const MAX_PUBLICATION_YEAR: u16 = 2100;

fn normalize_doi(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let stripped = ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "doi:"]
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map_or(trimmed, |prefix| &trimmed[prefix.len()..]);
    let doi = stripped.trim().trim_end_matches(['.', ',', ';']);
    doi.starts_with("10.").then(|| doi.to_string())
}

impl Record for Publication {
    const KIND: RecordKind = RecordKind::Publications;

    fn identity_key(&self) -> Option<String> {
        key_of(&self.title).or_else(|| key_of(&self.full_text))
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.authors, &other.authors, policy);
        merge_text(&mut self.title, &other.title, policy);
        merge_text(&mut self.venue, &other.venue, policy);
        merge_opt(&mut self.year, &other.year);
        merge_opt_text(&mut self.doi, &other.doi, policy);
        merge_opt_text(&mut self.url, &other.url, policy);
        merge_text(&mut self.full_text, &other.full_text, policy);
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let title = normalize_text(&self.title);
        let full_text = normalize_text(&self.full_text);
        if title.is_empty() && full_text.is_empty() {
            return None;
        }
        Some(Self {
            authors: normalize_text(&self.authors),
            title,
            venue: normalize_text(&self.venue),
            year: self
                .year
                .filter(|y| (MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(y)),
            doi: self.doi.as_deref().and_then(normalize_doi),
            url: opt_url(self.url.as_deref(), ctx),
            full_text,
        })
    }
}

/// A person listed on a staff page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub source_url: String,
}

impl Record for StaffMember {
    const KIND: RecordKind = RecordKind::Staff;

    fn identity_key(&self) -> Option<String> {
        let name = key_of(&self.name)?;
        match self.email.as_deref().and_then(normalize_email) {
            Some(email) => Some(format!("email:{email}")),
            None => Some(format!("name:{name}")),
        }
    }

    fn weak_key(&self) -> Option<String> {
        key_of(&self.name).map(|name| format!("name:{name}"))
    }

    fn has_strong_identity(&self) -> bool {
        self.email.as_deref().and_then(normalize_email).is_some()
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.name, &other.name, policy);
        merge_opt_text(&mut self.position, &other.position, policy);
        merge_opt_text(&mut self.email, &other.email, policy);
        merge_opt_text(&mut self.phone, &other.phone, policy);
        merge_opt_text(&mut self.department, &other.department, policy);
        merge_text(&mut self.source_url, &other.source_url, policy);
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let name = normalize_text(&self.name);
        if name.is_empty() {
            return None;
        }
        let source_url = normalize_url(&self.source_url, ctx.base_url)
            .unwrap_or_else(|| ctx.page_url.to_string());
        Some(Self {
            name,
            position: normalize_optional_text(self.position.as_deref()),
            email: self.email.as_deref().and_then(normalize_email),
            phone: self.phone.as_deref().and_then(normalize_phone),
            department: normalize_optional_text(self.department.as_deref()),
            source_url,
        })
    }
}

/// The institute's contact block. There is at most one per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub institute_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub social_media: BTreeMap<String, String>,
}

impl ContactInfo {
    fn is_empty(&self) -> bool {
        [
            &self.institute_name,
            &self.address,
            &self.city,
            &self.postal_code,
            &self.country,
            &self.phone,
            &self.fax,
            &self.email,
            &self.website,
        ]
        .iter()
        .all(|f| f.as_deref().is_none_or(|s| s.trim().is_empty()))
            && self.social_media.is_empty()
    }
}

impl Record for ContactInfo {
    const KIND: RecordKind = RecordKind::ContactInfo;

    fn identity_key(&self) -> Option<String> {
        (!self.is_empty()).then(|| "contact".to_string())
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_opt_text(&mut self.institute_name, &other.institute_name, policy);
        merge_opt_text(&mut self.address, &other.address, policy);
        merge_opt_text(&mut self.city, &other.city, policy);
        merge_opt_text(&mut self.postal_code, &other.postal_code, policy);
        merge_opt_text(&mut self.country, &other.country, policy);
        merge_opt_text(&mut self.phone, &other.phone, policy);
        merge_opt_text(&mut self.fax, &other.fax, policy);
        merge_opt_text(&mut self.email, &other.email, policy);
        merge_opt_text(&mut self.website, &other.website, policy);
        for (platform, url) in &other.social_media {
            self.social_media
                .entry(platform.clone())
                .or_insert_with(|| url.clone());
        }
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let social_media = self
            .social_media
            .iter()
            .filter_map(|(platform, url)| {
                let platform = platform.trim().to_lowercase();
                let url = normalize_url(url, ctx.page_url)?;
                (!platform.is_empty()).then_some((platform, url))
            })
            .collect();
        let normalized = Self {
            institute_name: normalize_optional_text(self.institute_name.as_deref()),
            address: normalize_optional_text(self.address.as_deref()),
            city: normalize_optional_text(self.city.as_deref()),
            postal_code: normalize_optional_text(self.postal_code.as_deref()),
            country: normalize_optional_text(self.country.as_deref()),
            phone: self.phone.as_deref().and_then(normalize_phone),
            fax: self.fax.as_deref().and_then(normalize_phone),
            email: self.email.as_deref().and_then(normalize_email),
            website: opt_url(self.website.as_deref(), ctx),
            social_media,
        };
        (!normalized.is_empty()).then_some(normalized)
    }
}

/// A funded research project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub period: String,
    pub funding: Option<String>,
    pub url: Option<String>,
    pub principal_investigator: Option<String>,
}

impl Record for Project {
    const KIND: RecordKind = RecordKind::Projects;

    fn identity_key(&self) -> Option<String> {
        key_of(&self.title)
    }

    fn absorb(&mut self, other: &Self, policy: ScalarConflict) {
        merge_text(&mut self.title, &other.title, policy);
        merge_text(&mut self.description, &other.description, policy);
        merge_text(&mut self.period, &other.period, policy);
        merge_opt_text(&mut self.funding, &other.funding, policy);
        merge_opt_text(&mut self.url, &other.url, policy);
        merge_opt_text(
            &mut self.principal_investigator,
            &other.principal_investigator,
            policy,
        );
    }

    fn normalize(self, ctx: &PageContext<'_>) -> Option<Self> {
        let title = normalize_text(&self.title);
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title,
            description: normalize_text(&self.description),
            period: collapse_whitespace(&self.period),
            funding: normalize_optional_text(self.funding.as_deref()),
            url: opt_url(self.url.as_deref(), ctx),
            principal_investigator: normalize_optional_text(
                self.principal_investigator.as_deref(),
            ),
        })
    }
}

/// A link found in a page's content area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subpage {
    pub title: String,
    pub url: String,
}

/// Title and text of one crawled page, with the links it leads to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub subpages: Vec<Subpage>,
}

/// A heading of a detail page with the text that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub title: String,
    pub content: String,
}

/// An image on a detail page, resolved against the page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub url: String,
    pub alt: String,
    pub title: String,
}

/// Grant references, amounts and agencies mentioned on a project page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amounts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agencies: Vec<String>,
}

impl FundingInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reference_codes.is_empty() && self.amounts.is_empty() && self.agencies.is_empty()
    }
}

/// Year range and duration of a project, as written on its page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl PeriodInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_period.is_none() && self.duration.is_none()
    }
}

/// Everything read from one project's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub url: String,
    pub title: String,
    pub content: String,
    pub sections: Vec<ContentSection>,
    pub images: Vec<PageImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_info: Option<FundingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_info: Option<PeriodInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_members: Vec<String>,
}
