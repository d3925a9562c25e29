//! The Mixcloud `hosts` listing for the station's account.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use voices_core::{artist::ArtistIdentity, source::ArtistDirectory};

use crate::{Error, Result, http};

pub const DEFAULT_BASE_URL: &str = "https://api.mixcloud.com";
pub const DEFAULT_ACCOUNT: &str = "VoicesRadio";
pub const DEFAULT_MAX_PAGES: usize = 10;

const PAGE_SIZE: usize = 100;

/// Client for the roster of hosts on a Mixcloud account.
///
/// Follows `paging.next` links until the listing ends or `max_pages`
/// requests have been made.
#[derive(Clone)]
pub struct MixcloudDirectory {
  client:    Client,
  base_url:  String,
  account:   String,
  max_pages: usize,
}

impl MixcloudDirectory {
  pub fn new(
    base_url: impl Into<String>,
    account: impl Into<String>,
    max_pages: usize,
  ) -> Result<Self> {
    Ok(Self {
      client:    http::client()?,
      base_url:  base_url.into(),
      account:   account.into(),
      max_pages: max_pages.max(1),
    })
  }

  fn first_page_url(&self) -> String {
    http::join(
      &self.base_url,
      &format!("/{}/hosts/?limit={PAGE_SIZE}", self.account),
    )
  }

  async fn fetch_page(&self, url: &str) -> Result<HostsPage> {
    let resp = self.client.get(url).send().await?;
    Ok(http::check(resp)?.json().await?)
  }
}

impl ArtistDirectory for MixcloudDirectory {
  type Error = Error;

  async fn list_artists(&self) -> Result<Vec<ArtistIdentity>> {
    let mut artists = Vec::new();
    let mut next = Some(self.first_page_url());
    let mut pages = 0;

    while let Some(url) = next.take() {
      if pages == self.max_pages {
        warn!(pages, account = %self.account, "roster truncated at page limit");
        break;
      }
      let page = self.fetch_page(&url).await?;
      pages += 1;

      next = page.paging.and_then(|p| p.next);
      artists.extend(page.data.into_iter().filter_map(RawHost::into_identity));
    }

    debug!(count = artists.len(), pages, "fetched artist roster");
    Ok(artists)
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct HostsPage {
  #[serde(default)]
  data:   Vec<RawHost>,
  #[serde(default)]
  paging: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
  next: Option<String>,
}

#[derive(Deserialize)]
struct RawHost {
  #[serde(default)]
  name:     String,
  #[serde(default)]
  username: String,
}

impl RawHost {
  /// Hosts without a username cannot be followed and are dropped.
  fn into_identity(self) -> Option<ArtistIdentity> {
    if self.username.trim().is_empty() {
      return None;
    }
    Some(ArtistIdentity::new(self.name, self.username))
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use axum::{Json, Router, extract::Query, routing::get};
  use serde_json::{Value, json};

  use super::*;
  use crate::testing::serve;

  /// Two pages of hosts, linked by an absolute `next` URL.
  fn two_page_router(base: String, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
      "/VoicesRadio/hosts/",
      get(move |Query(q): Query<HashMap<String, String>>| {
        let base = base.clone();
        let hits = hits.clone();
        async move {
          hits.fetch_add(1, Ordering::SeqCst);
          let body: Value = if q.contains_key("offset") {
            json!({
              "data": [{"name": "Marcus", "username": "marcus99", "key": "/marcus99/"}],
              "paging": {"previous": format!("{base}/VoicesRadio/hosts/")}
            })
          } else {
            json!({
              "data": [
                {"name": "Nova", "username": "djnova"},
                {"name": "Ghost", "username": ""}
              ],
              "paging": {"next": format!("{base}/VoicesRadio/hosts/?offset=100")}
            })
          };
          Json(body)
        }
      }),
    )
  }

  #[tokio::test]
  async fn follows_paging_links() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let base = serve(move |base| two_page_router(base, h)).await;

    let dir = MixcloudDirectory::new(base, "VoicesRadio", DEFAULT_MAX_PAGES).unwrap();
    let artists = dir.list_artists().await.unwrap();

    assert_eq!(artists, vec![
      ArtistIdentity::new("Nova", "djnova"),
      ArtistIdentity::new("Marcus", "marcus99"),
    ]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn stops_at_page_limit() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let base = serve(move |base| two_page_router(base, h)).await;

    let dir = MixcloudDirectory::new(base, "VoicesRadio", 1).unwrap();
    let artists = dir.list_artists().await.unwrap();

    assert_eq!(artists, vec![ArtistIdentity::new("Nova", "djnova")]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn missing_account_is_an_error() {
    let base = serve(|_| Router::new()).await;
    let dir = MixcloudDirectory::new(base, "Nobody", 1).unwrap();
    let err = dir.list_artists().await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 404));
  }

  #[test]
  fn page_without_paging_ends_listing() {
    let page: HostsPage =
      serde_json::from_value(json!({"data": [{"name": "Solo", "username": "solo"}]}))
        .unwrap();
    assert!(page.paging.is_none());
    assert_eq!(page.data.len(), 1);
  }
}
