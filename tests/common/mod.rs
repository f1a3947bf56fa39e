#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use finisher::Fetch;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

pub fn listing_html(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, href)| {
            format!(r#"<tr><td>row</td><td class="result-table-td-btn"><a href="{href}">{label}</a></td></tr>"#)
        })
        .collect();
    format!("<html><body><table class=\"result-table\"><tbody>{rows}</tbody></table></body></html>")
}

pub fn detail_html(number: &str, name: &str, clock: &str, net: &str, placement: &str) -> String {
    format!(
        r#"<html><body>
<div class="container main"><div><div class="col-md-9 col-md-push-3"><div class="content"><div><div>
  <div class="infobox">
    <div>ナンバー</div>
    <div>{number}</div>
  </div>
  <div class="infobox">
    <div>氏名</div>
    <div>{name}</div>
  </div>
  <div><div><table><tbody>
    <tr><th>タイム</th><td>{clock}</td></tr>
    <tr><th>ネットタイム</th><td>{net}</td></tr>
    <tr><th>順位</th><td>{placement}</td></tr>
  </tbody></table></div></div>
</div></div></div></div></div></div>
</body></html>"#
    )
}

/// In-memory site. Unknown urls behave like a refused connection.
#[derive(Default)]
pub struct StubSite {
    pages: HashMap<String, String>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub requests: Mutex<Vec<String>>,
}

impl StubSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetch for StubSite {
    async fn get_html(&self, url: &Url) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(url.as_str()) {
            Some(html) => Ok(html.clone()),
            None => bail!("connection refused: {url}"),
        }
    }
}
