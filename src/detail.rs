use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::PageSchema;
use crate::fetch::Fetch;
use crate::limiter::Limiter;

/// One participant's result. Fields that could not be extracted stay at
/// their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRecord {
    pub name: String,
    pub number: i64,
    pub clock_time: String,
    pub net_time: String,
    pub placement: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Number,
    ClockTime,
    NetTime,
    Placement,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Name => "name",
            Field::Number => "number",
            Field::ClockTime => "clockTime",
            Field::NetTime => "netTime",
            Field::Placement => "placement",
        };
        f.write_str(s)
    }
}

/// A tolerated failure while building a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("{field} not found on page")]
    Missing { field: Field },
    #[error("{field}: {text:?} is not an integer")]
    NotANumber {
        field: Field,
        text: String,
        #[source]
        source: ParseIntError,
    },
}

/// Result of one detail page. Always carries a record; `problems` says
/// which parts of it are zero-filled.
#[derive(Debug)]
pub struct Extraction {
    pub url: String,
    pub record: FinishRecord,
    pub problems: Vec<ExtractError>,
}

impl Extraction {
    /// A zero record for a page that never produced HTML.
    pub fn failed(url: impl Into<String>, error: ExtractError) -> Self {
        Self {
            url: url.into(),
            record: FinishRecord::default(),
            problems: vec![error],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Fetches one detail page and extracts its record. Always returns exactly
/// one `Extraction`, whatever fails along the way.
pub async fn extract_detail(
    fetcher: &dyn Fetch,
    limiter: &Limiter,
    schema: &PageSchema,
    url: &Url,
) -> Extraction {
    let permit = match limiter.acquire().await {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("{e:#}");
            error!(%url, error = %msg, "could not acquire fetch slot");
            return Extraction::failed(url.as_str(), ExtractError::Fetch(msg));
        }
    };

    let extraction = match fetcher.get_html(url).await {
        Ok(html) => {
            let (record, problems) = parse_finish_record(&html, schema);
            for p in &problems {
                warn!(%url, problem = %p, "incomplete finish record");
            }
            debug!(%url, number = record.number, "detail page parsed");
            Extraction {
                url: url.to_string(),
                record,
                problems,
            }
        }
        Err(e) => {
            let msg = format!("{e:#}");
            error!(%url, error = %msg, "failed to extract finish details");
            Extraction::failed(url.as_str(), ExtractError::Fetch(msg))
        }
    };
    permit.release();
    extraction
}

/// Builds a record from a detail page, collecting every field that had to
/// be left at zero.
pub fn parse_finish_record(html: &str, schema: &PageSchema) -> (FinishRecord, Vec<ExtractError>) {
    let doc = Html::parse_document(html);
    let mut record = FinishRecord::default();
    let mut problems = Vec::new();

    let mut number_text: Option<String> = None;
    let mut name: Option<String> = None;
    for bx in doc.select(&schema.info_box) {
        let lines = info_lines(&bx);
        for pair in lines.windows(2) {
            if pair[0] == schema.number_label && number_text.is_none() {
                number_text = Some(pair[1].clone());
            } else if pair[0] == schema.name_label && name.is_none() {
                name = Some(pair[1].clone());
            }
        }
    }

    match number_text {
        Some(text) => match parse_int(Field::Number, &text) {
            Ok(n) => record.number = n,
            Err(e) => problems.push(e),
        },
        None => problems.push(ExtractError::Missing {
            field: Field::Number,
        }),
    }
    match name {
        Some(n) => record.name = n,
        None => problems.push(ExtractError::Missing { field: Field::Name }),
    }

    match first_text(&doc, &schema.clock_time) {
        Some(t) => record.clock_time = t,
        None => problems.push(ExtractError::Missing {
            field: Field::ClockTime,
        }),
    }
    match first_text(&doc, &schema.net_time) {
        Some(t) => record.net_time = t,
        None => problems.push(ExtractError::Missing {
            field: Field::NetTime,
        }),
    }

    match first_text(&doc, &schema.placement) {
        Some(t) => {
            let cleaned = t.replace(schema.rank_glyph, "");
            match parse_int(Field::Placement, cleaned.trim()) {
                Ok(n) => record.placement = n,
                Err(e) => problems.push(e),
            }
        }
        None => problems.push(ExtractError::Missing {
            field: Field::Placement,
        }),
    }

    (record, problems)
}

// -------------------------
// Parsing helpers
// -------------------------

/// Non-blank trimmed lines of an element's text.
fn info_lines(el: &ElementRef) -> Vec<String> {
    el.text()
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn parse_int(field: Field, text: &str) -> Result<i64, ExtractError> {
    text.parse::<i64>()
        .map_err(|source| ExtractError::NotANumber {
            field,
            text: text.to_string(),
            source,
        })
}
