//! Async HTTP client fetching Wiktionary articles.

use std::{collections::BTreeMap, time::Duration};

use futures::future::join_all;
use lexis_core::{entry::Chart, language::Language, store::ScrapedCharts};
use reqwest::{Client, StatusCode, Url};

use crate::{
  error::{Error, Result},
  extract::extract_charts,
};

pub const DEFAULT_BASE_URL: &str = "https://en.wiktionary.org/wiki";

/// Combining acute accent, used in learner texts to mark stress.
const STRESS_MARK: char = '\u{301}';

/// Connection settings for the article source.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ScraperConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_BASE_URL.to_owned(), timeout: Duration::from_secs(30) }
  }
}

/// Outcome of one batch: charts for every word that could be fetched, and
/// the error for every word that could not.
#[derive(Debug, Default)]
pub struct ScrapeReport {
  pub charts:   ScrapedCharts,
  pub failures: BTreeMap<String, Error>,
}

/// Fetches inflection charts for words.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Scraper {
  client: Client,
  base:   Url,
}

impl Scraper {
  /// Build a scraper. Fails when `base_url` is not an absolute URL that
  /// can take path segments.
  pub fn new(config: ScraperConfig) -> Result<Self> {
    let bad_url = |reason: String| Error::BaseUrl { url: config.base_url.clone(), reason };
    let mut base = Url::parse(&config.base_url).map_err(|e| bad_url(e.to_string()))?;
    match base.path_segments_mut() {
      Ok(mut segments) => {
        segments.pop_if_empty();
      }
      Err(()) => return Err(bad_url("cannot hold a path".to_owned())),
    }

    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("lexis/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(Error::Client)?;
    Ok(Self { client, base })
  }

  /// Article URL for `word`, with stress marks removed. The word is one
  /// percent-encoded path segment.
  pub fn url_for(&self, word: &str) -> Url {
    let bare: String = word.chars().filter(|c| *c != STRESS_MARK).collect();
    let mut url = self.base.clone();
    // `new` rejected bases that cannot hold a path.
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.push(&bare);
    }
    url
  }

  /// Fetch every word concurrently.
  ///
  /// Without a language there is nothing to extract, so every word maps to
  /// an empty list and no request is made. One failing word never affects
  /// the others.
  pub async fn scrape<'a, I>(&self, words: I, lang: Option<Language>) -> ScrapeReport
  where
    I: IntoIterator<Item = &'a str>,
  {
    let words: Vec<&str> = words.into_iter().collect();
    let mut report = ScrapeReport::default();

    let Some(lang) = lang else {
      report.charts = words.into_iter().map(|w| (w.to_owned(), Vec::new())).collect();
      return report;
    };

    let results = join_all(words.iter().map(|word| self.fetch(word, lang))).await;
    for (word, result) in words.into_iter().zip(results) {
      match result {
        Ok(charts) => {
          report.charts.insert(word.to_owned(), charts);
        }
        Err(err) => {
          tracing::warn!(%word, error = %err, "scrape failed");
          report.failures.insert(word.to_owned(), err);
        }
      }
    }

    tracing::info!(
      %lang,
      fetched = report.charts.len(),
      failed = report.failures.len(),
      "scraped charts"
    );
    report
  }

  /// `GET <base_url>/<word>`; a missing article is an empty list.
  async fn fetch(&self, word: &str, lang: Language) -> Result<Vec<Chart>> {
    let fetch_err = |source| Error::Fetch { word: word.to_owned(), source };

    let resp = self
      .client
      .get(self.url_for(word))
      .send()
      .await
      .map_err(fetch_err)?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      tracing::debug!(%word, "no article");
      return Ok(Vec::new());
    }
    if !status.is_success() {
      return Err(Error::Status { word: word.to_owned(), status: status.as_u16() });
    }

    let body = resp.text().await.map_err(fetch_err)?;
    let charts = extract_charts(&body, lang);
    tracing::debug!(%word, charts = charts.len(), "extracted charts");
    Ok(charts)
  }
}

#[cfg(test)]
mod tests {
  use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
  };

  use super::*;

  const PARLER: &str = r#"<table><tr><td><span class="lang-fr">parle</span></td><td>parles</td></tr></table>"#;

  /// Serve fixed `(path, status, body)` routes on a local port; anything
  /// else is a 404. Returns the base URL.
  async fn serve(routes: &'static [(&'static str, u16, &'static str)]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      while let Ok((mut sock, _)) = listener.accept().await {
        tokio::spawn(async move {
          let mut buf = vec![0u8; 8192];
          let mut read = 0;
          loop {
            let n = sock.read(&mut buf[read..]).await.unwrap();
            if n == 0 {
              return;
            }
            read += n;
            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
              break;
            }
          }
          let head = String::from_utf8_lossy(&buf[..read]).into_owned();
          let path = head.split_whitespace().nth(1).unwrap_or("/");
          let (status, body) = routes
            .iter()
            .find(|(p, ..)| *p == path)
            .map_or((404, ""), |(_, s, b)| (*s, *b));
          let resp = format!(
            "HTTP/1.1 {status} X\r\ncontent-type: text/html\r\ncontent-length: \
             {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
          );
          sock.write_all(resp.as_bytes()).await.unwrap();
        });
      }
    });
    format!("http://{addr}/wiki/")
  }

  fn scraper(base_url: String) -> Scraper {
    Scraper::new(ScraperConfig { base_url, timeout: Duration::from_secs(5) }).unwrap()
  }

  #[test]
  fn url_strips_stress_marks() {
    let s = scraper("https://example.org/wiki/".into());
    assert_eq!(
      s.url_for("кни\u{301}га").as_str(),
      "https://example.org/wiki/%D0%BA%D0%BD%D0%B8%D0%B3%D0%B0"
    );
  }

  #[test]
  fn reserved_characters_stay_inside_the_word() {
    let s = scraper("https://example.org/wiki".into());
    assert_eq!(
      s.url_for("a/b?c#d").as_str(),
      "https://example.org/wiki/a%2Fb%3Fc%23d"
    );
    assert_eq!(s.url_for("a b").as_str(), "https://example.org/wiki/a%20b");
  }

  #[test]
  fn unusable_base_url_is_rejected() {
    for base_url in ["not a url", "mailto:someone@example.org"] {
      let config = ScraperConfig { base_url: base_url.into(), ..Default::default() };
      assert!(matches!(Scraper::new(config), Err(Error::BaseUrl { .. })));
    }
  }

  #[tokio::test]
  async fn no_language_makes_no_requests() {
    // Nothing listens here; any request would fail.
    let s = scraper("http://127.0.0.1:9/wiki".into());
    let report = s.scrape(["a", "b"], None).await;
    assert!(report.failures.is_empty());
    assert_eq!(report.charts.len(), 2);
    assert!(report.charts.values().all(Vec::is_empty));
  }

  #[tokio::test]
  async fn mixed_batch_keeps_successes_and_records_failures() {
    static ROUTES: &[(&str, u16, &str)] =
      &[("/wiki/parler", 200, PARLER), ("/wiki/broken", 500, "oops")];
    let s = scraper(serve(ROUTES).await);

    let report = s
      .scrape(["parle\u{301}r", "absent", "broken"], Some(Language::French))
      .await;

    let parler = &report.charts["parle\u{301}r"];
    assert_eq!(parler.len(), 1);
    assert_eq!(parler[0].rows(), [vec!["parle", "parles"]]);

    assert!(report.charts["absent"].is_empty());

    assert!(!report.charts.contains_key("broken"));
    assert!(matches!(
      report.failures.get("broken"),
      Some(Error::Status { status: 500, .. })
    ));
  }
}
