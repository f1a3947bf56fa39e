use anyhow::{Context, Result, anyhow};
use scraper::Selector;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use url::Url;

use crate::listing::PageRef;

// -------------------------
// Compile-time settings
// -------------------------

pub const PARALLELISM: usize = 4;
pub const BASE_URL: &str = "https://sporoku.jp";
pub const LIST_PATH: &str = "/result/naha_20231203/list";
pub const RACE_ID: u32 = 3625;
pub const START_PAGE: u32 = 1;
pub const END_PAGE: u32 = 274;
pub const OUTPUT_FILE: &str = "marathon.json";

// Page schema of the results site. These track the site's markup.
pub const DETAIL_BUTTON_SELECTOR: &str = ".result-table-td-btn";
pub const DETAIL_LABEL: &str = "詳細";
pub const INFO_BOX_SELECTOR: &str = "div.infobox";
pub const NUMBER_LABEL: &str = "ナンバー";
pub const NAME_LABEL: &str = "氏名";
pub const CLOCK_TIME_SELECTOR: &str = "body > div.container.main > div > div.col-md-9.col-md-push-3 > div.content > div > div > div:nth-child(3) > div > table > tbody > tr:nth-child(1) > td";
pub const NET_TIME_SELECTOR: &str = "body > div.container.main > div > div.col-md-9.col-md-push-3 > div.content > div > div > div:nth-child(3) > div > table > tbody > tr:nth-child(2) > td";
pub const PLACEMENT_SELECTOR: &str = "body > div.container.main > div > div.col-md-9.col-md-push-3 > div.content > div > div > div:nth-child(3) > div > table > tbody > tr:nth-child(3) > td";
pub const RANK_GLYPH: char = '位';

/// Selectors and literal labels the scraper depends on, compiled once.
#[derive(Debug, Clone)]
pub struct PageSchema {
    pub detail_button: Selector,
    pub detail_anchor: Selector,
    pub detail_label: String,
    pub info_box: Selector,
    pub number_label: String,
    pub name_label: String,
    pub clock_time: Selector,
    pub net_time: Selector,
    pub placement: Selector,
    pub rank_glyph: char,
}

impl PageSchema {
    /// Schema of the live results site.
    pub fn sporoku() -> Result<Self> {
        Ok(Self {
            detail_button: parse_selector(DETAIL_BUTTON_SELECTOR)?,
            detail_anchor: parse_selector("a")?,
            detail_label: DETAIL_LABEL.to_string(),
            info_box: parse_selector(INFO_BOX_SELECTOR)?,
            number_label: NUMBER_LABEL.to_string(),
            name_label: NAME_LABEL.to_string(),
            clock_time: parse_selector(CLOCK_TIME_SELECTOR)?,
            net_time: parse_selector(NET_TIME_SELECTOR)?,
            placement: parse_selector(PLACEMENT_SELECTOR)?,
            rank_glyph: RANK_GLYPH,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    // scraper's SelectorErrorKind borrows the input, so flatten it to text
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{css}`: {e}"))
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub parallelism: usize,
    pub base_url: Url,
    pub list_path: String,
    pub race_id: u32,
    pub pages: RangeInclusive<u32>,
    pub output: PathBuf,
    pub schema: PageSchema,
}

impl ScrapeConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid base url")?;
        Ok(Self {
            parallelism: PARALLELISM,
            base_url,
            list_path: LIST_PATH.to_string(),
            race_id: RACE_ID,
            pages: START_PAGE..=END_PAGE,
            output: PathBuf::from(OUTPUT_FILE),
            schema: PageSchema::sporoku()?,
        })
    }

    /// The live site with the built-in race and page range.
    pub fn sporoku() -> Result<Self> {
        Self::new(BASE_URL)
    }

    pub fn page_refs(&self) -> Vec<PageRef> {
        self.pages.clone().map(PageRef).collect()
    }

    /// `{base}{list_path}?race_id={id}&page={n}`
    pub fn listing_url(&self, page: PageRef) -> Result<Url> {
        let mut u = self
            .base_url
            .join(&self.list_path)
            .context("build listing url failed")?;
        u.query_pairs_mut()
            .clear()
            .append_pair("race_id", &self.race_id.to_string())
            .append_pair("page", &page.0.to_string());
        Ok(u)
    }

    /// Resolves a relative detail path against the base url.
    pub fn detail_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("bad detail path {path:?}"))
    }
}
