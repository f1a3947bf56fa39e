use scraper::Html;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::PageSchema;
use crate::fetch::Fetch;
use crate::limiter::Limiter;

/// Listing page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef(pub u32);

/// Relative detail path exactly as it appears in the listing's `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink(pub String);

impl DetailLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything one listing page contributed. `error` is set when the page
/// could not be fetched; `links` is then empty.
#[derive(Debug, Clone)]
pub struct Listing {
    pub page: PageRef,
    pub links: Vec<DetailLink>,
    pub error: Option<String>,
}

/// Fetches one listing page and collects its detail links. Never fails:
/// problems are logged and leave `links` empty.
pub async fn enumerate_page(
    fetcher: &dyn Fetch,
    limiter: &Limiter,
    schema: &PageSchema,
    page: PageRef,
    url: &Url,
) -> Listing {
    let permit = match limiter.acquire().await {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("{e:#}");
            error!(%url, page = page.0, error = %msg, "could not acquire fetch slot");
            return Listing {
                page,
                links: Vec::new(),
                error: Some(msg),
            };
        }
    };
    let fetched = fetcher.get_html(url).await;

    let listing = match fetched {
        Ok(html) => {
            let links = extract_detail_links(&html, schema);
            if links.is_empty() {
                warn!(%url, page = page.0, "listing page has no detail links");
            } else {
                debug!(%url, page = page.0, links = links.len(), "listing page parsed");
            }
            Listing {
                page,
                links,
                error: None,
            }
        }
        Err(e) => {
            let msg = format!("{e:#}");
            error!(%url, page = page.0, error = %msg, "failed to extract links from listing page");
            Listing {
                page,
                links: Vec::new(),
                error: Some(msg),
            }
        }
    };
    permit.release();
    listing
}

/// Hrefs of every detail-button cell whose anchor reads `schema.detail_label`.
pub fn extract_detail_links(html: &str, schema: &PageSchema) -> Vec<DetailLink> {
    let doc = Html::parse_document(html);
    doc.select(&schema.detail_button)
        .filter_map(|cell| cell.select(&schema.detail_anchor).next())
        .filter(|a| a.text().collect::<String>().trim() == schema.detail_label)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| DetailLink(href.to_string()))
        .collect()
}
