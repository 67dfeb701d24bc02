//! Staff strategies.
//!
//! 1. `container`: person cards (`.person`, `.staff-member`, ...).
//! 2. `table`: tabular directories, columns mapped from header keywords or
//!    inferred from cell content when the table has no header.
//! 3. `list` (fallback): `<ul>` lists that mention academic titles.
//! 4. `text` (fallback): "Name, Position" / "Name email" patterns.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::document::{content_root, first_mailto, first_text, parse_selector, text_of};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::records::{PageContext, StaffMember};

static PERSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".person, .staff-member, .team-member, .contact-info, .user-details")
        .expect("BUG: hardcoded CSS selector for person cards is invalid")
});

static NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h3, h4, .name, strong, .title")
        .expect("BUG: hardcoded CSS selector for person names is invalid")
});

static POSITION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".position, .job, .role, em, .subtitle")
        .expect("BUG: hardcoded CSS selector for positions is invalid")
});

static PHONE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".phone, .tel, .telephone")
        .expect("BUG: hardcoded CSS selector for phones is invalid")
});

static DEPARTMENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".department, .dept, .group")
        .expect("BUG: hardcoded CSS selector for departments is invalid")
});

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table").expect("BUG: hardcoded CSS selector 'table' is invalid")
});

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("tr").expect("BUG: hardcoded CSS selector 'tr' is invalid")
});

static HEADER_CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("th").expect("BUG: hardcoded CSS selector 'th' is invalid")
});

static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td, th").expect("BUG: hardcoded CSS selector 'td, th' is invalid")
});

static LIST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul").expect("BUG: hardcoded CSS selector 'ul' is invalid")
});

static LIST_ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li").expect("BUG: hardcoded CSS selector 'li' is invalid")
});

static EMAIL_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("BUG: hardcoded email regex is invalid")
});

static PHONE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Telephone|Phone|Tel|Tlf)[:.\s]+(\+?[\d\s().-]{7,})")
        .expect("BUG: hardcoded labelled phone regex is invalid")
});

static LIST_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:[,;:]|\s[-–]\s)\s*").expect("BUG: hardcoded list split regex is invalid")
});

static NAME_POSITION_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\p{Lu}\p{Ll}+ \p{Lu}\p{Ll}+(?: \p{Lu}\p{Ll}+)?)[,:.]?\s+((?:Professor|Prof|Dr|Director|Researcher|Head)[^,\n]*)",
    )
    .expect("BUG: hardcoded name/position regex is invalid")
});

static NAME_EMAIL_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{Lu}\p{Ll}+ \p{Lu}\p{Ll}+(?: \p{Lu}\p{Ll}+)?)[,:.]?\s+([\w.+-]+@[\w-]+(?:\.[\w-]+)+)")
        .expect("BUG: hardcoded name/email regex is invalid")
});

const LIST_MARKERS: &[&str] = &["professor", "doctor", "researcher", "phd", "investigador"];
const MIN_LIST_ITEM_CHARS: usize = 5;
const MIN_PHONE_DIGITS: usize = 6;

fn email_in(text: &str) -> Option<String> {
    EMAIL_IN_TEXT.find(text).map(|m| m.as_str().to_string())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Person cards.
#[derive(Debug, Clone)]
pub struct StaffContainerStrategy {
    card: Selector,
}

impl Default for StaffContainerStrategy {
    fn default() -> Self {
        Self {
            card: PERSON_SELECTOR.clone(),
        }
    }
}

impl StaffContainerStrategy {
    /// Use a site-specific card selector.
    pub fn with_selector(card: &str) -> Result<Self, StructuralParseError> {
        Ok(Self {
            card: parse_selector(card)?,
        })
    }

    fn read_card(card: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<StaffMember> {
        let name = first_text(card, &NAME_SELECTOR)?;
        let text = text_of(card);
        let phone = first_text(card, &PHONE_SELECTOR)
            .or_else(|| PHONE_IN_TEXT.captures(&text).map(|c| c[1].trim().to_string()));
        Some(StaffMember {
            position: first_text(card, &POSITION_SELECTOR).filter(|p| *p != name),
            email: first_mailto(card).or_else(|| email_in(&text)),
            phone,
            department: first_text(card, &DEPARTMENT_SELECTOR),
            source_url: ctx.page_url.to_string(),
            name,
        })
    }
}

impl Strategy<StaffMember> for StaffContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<StaffMember>, StructuralParseError> {
        Ok(doc
            .select(&self.card)
            .filter_map(|card| Self::read_card(card, ctx))
            .collect())
    }
}

/// Column positions of a staff table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ColumnMap {
    name: Option<usize>,
    position: Option<usize>,
    email: Option<usize>,
    phone: Option<usize>,
    department: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let h = header.to_lowercase();
            let has = |words: &[&str]| words.iter().any(|w| h.contains(w));
            if map.name.is_none() && has(&["name", "nombre"]) {
                map.name = Some(i);
            } else if map.position.is_none() && has(&["position", "cargo", "puesto", "role"]) {
                map.position = Some(i);
            } else if map.email.is_none() && has(&["email", "e-mail", "correo", "mail"]) {
                map.email = Some(i);
            } else if map.phone.is_none() && has(&["phone", "telefono", "teléfono", "tel"]) {
                map.phone = Some(i);
            } else if map.department.is_none()
                && has(&["department", "departamento", "group", "grupo"])
            {
                map.department = Some(i);
            }
        }
        map
    }

    /// Guess columns from the first data row: an `@` cell is the email,
    /// a mostly-digit cell the phone, the first remaining text cell the name.
    fn infer(cells: &[String]) -> Self {
        let mut map = Self::default();
        for (i, cell) in cells.iter().enumerate() {
            let digits = cell.chars().filter(char::is_ascii_digit).count();
            if map.email.is_none() && EMAIL_IN_TEXT.is_match(cell) {
                map.email = Some(i);
            } else if map.phone.is_none() && digits >= MIN_PHONE_DIGITS {
                map.phone = Some(i);
            } else if map.name.is_none() && !cell.is_empty() && digits == 0 {
                map.name = Some(i);
            }
        }
        map
    }

    fn width(&self) -> usize {
        [self.name, self.position, self.email, self.phone, self.department]
            .into_iter()
            .flatten()
            .max()
            .map_or(0, |m| m + 1)
    }
}

/// Tabular staff directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaffTableStrategy;

impl StaffTableStrategy {
    fn read_table(
        table: ElementRef<'_>,
        ctx: &PageContext<'_>,
    ) -> Result<Vec<StaffMember>, StructuralParseError> {
        let rows: Vec<ElementRef<'_>> = table.select(&ROW_SELECTOR).collect();
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let cells_of = |row: &ElementRef<'_>| -> Vec<String> {
            row.select(&CELL_SELECTOR).map(text_of).collect()
        };

        let header_cells: Vec<String> = first.select(&HEADER_CELL_SELECTOR).map(text_of).collect();
        let mut columns = ColumnMap::from_headers(&cells_of(first));
        let mut data_start = usize::from(!header_cells.is_empty());
        if columns.name.is_some() {
            // A keyword header row is a header even when written with <td>.
            data_start = 1;
        } else if header_cells.is_empty() {
            columns = ColumnMap::infer(&cells_of(first));
            data_start = 0;
        }
        if columns.name.is_none() {
            return Ok(Vec::new());
        }

        let width = columns.width();
        let data_rows: Vec<_> = rows[data_start..]
            .iter()
            .map(|row| (row, cells_of(row)))
            // Single-cell rows are group captions spanning the table.
            .filter(|(_, cells)| cells.len() > 1)
            .collect();
        let short_rows = data_rows.iter().filter(|(_, c)| c.len() < width).count();
        if short_rows * 2 > data_rows.len() {
            return Err(StructuralParseError::RaggedTable {
                rows: data_rows.len(),
                short_rows,
                expected: width,
            });
        }

        let pick = |cells: &[String], idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| cells.get(i)).cloned().and_then(non_empty)
        };
        Ok(data_rows
            .into_iter()
            .filter(|(_, cells)| cells.len() >= width)
            .filter_map(|(row, cells)| {
                let name = pick(&cells, columns.name)?;
                let email = pick(&cells, columns.email).or_else(|| first_mailto(*row));
                Some(StaffMember {
                    name,
                    position: pick(&cells, columns.position),
                    email,
                    phone: pick(&cells, columns.phone),
                    department: pick(&cells, columns.department),
                    source_url: ctx.page_url.to_string(),
                })
            })
            .collect())
    }
}

impl Strategy<StaffMember> for StaffTableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<StaffMember>, StructuralParseError> {
        let mut staff = Vec::new();
        for table in doc.select(&TABLE_SELECTOR) {
            match Self::read_table(table, ctx) {
                Ok(rows) => staff.extend(rows),
                Err(e) => debug!(
                    target: "institute_scrape::extract",
                    "skipping table on {}: {e}",
                    ctx.page_url
                ),
            }
        }
        Ok(staff)
    }
}

/// Lists of people ("Name, Position") that mention academic titles.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaffListStrategy;

impl Strategy<StaffMember> for StaffListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<StaffMember>, StructuralParseError> {
        let mut staff = Vec::new();
        for list in doc.select(&LIST_SELECTOR) {
            let list_text = text_of(list).to_lowercase();
            if !LIST_MARKERS.iter().any(|m| list_text.contains(m)) {
                continue;
            }
            for item in list.select(&LIST_ITEM_SELECTOR) {
                let text = text_of(item);
                if text.chars().count() < MIN_LIST_ITEM_CHARS {
                    continue;
                }
                let mut parts = LIST_SPLIT.splitn(&text, 2);
                let name = parts.next().unwrap_or_default().trim().to_string();
                let position = parts
                    .next()
                    .map(|rest| EMAIL_IN_TEXT.replace_all(rest, "").trim().to_string())
                    .and_then(non_empty);
                if name.is_empty() || EMAIL_IN_TEXT.is_match(&name) {
                    continue;
                }
                staff.push(StaffMember {
                    name,
                    position,
                    email: first_mailto(item).or_else(|| email_in(&text)),
                    phone: None,
                    department: None,
                    source_url: ctx.page_url.to_string(),
                });
            }
        }
        Ok(staff)
    }
}

/// Free-text fallback over the main content area.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaffTextStrategy;

impl Strategy<StaffMember> for StaffTextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<StaffMember>, StructuralParseError> {
        let text = text_of(content_root(doc));
        let with_position = NAME_POSITION_TEXT.captures_iter(&text).map(|c| StaffMember {
            name: c[1].to_string(),
            position: non_empty(c[2].to_string()),
            source_url: ctx.page_url.to_string(),
            ..Default::default()
        });
        let with_email = NAME_EMAIL_TEXT.captures_iter(&text).map(|c| StaffMember {
            name: c[1].to_string(),
            email: Some(c[2].to_string()),
            source_url: ctx.page_url.to_string(),
            ..Default::default()
        });
        Ok(with_position.chain(with_email).collect())
    }
}

/// The stock staff extractor.
#[must_use]
pub fn extractor() -> Extractor<StaffMember> {
    Extractor::new(vec![
        Box::new(StaffContainerStrategy::default()),
        Box::new(StaffTableStrategy),
        Box::new(StaffListStrategy),
        Box::new(StaffTextStrategy),
    ])
}
