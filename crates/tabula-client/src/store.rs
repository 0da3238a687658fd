//! External query-string storage.
//!
//! The page number and filters live in the URL so that a listing survives
//! reloads and can be linked to. [`QueryStore`] abstracts that location;
//! [`UrlQueryStore`] is the default, URL-backed implementation.

use std::borrow::Cow;
use std::sync::Arc;

use tabula_core::{Error, Result};
use tokio::sync::watch;
use url::Url;
use url::form_urlencoded;

/// Type alias for a shared query store.
pub type BoxedQueryStore = Arc<dyn QueryStore>;

/// Reads and writes query-string parameters.
pub trait QueryStore: Send + Sync {
    /// Returns the decoded value of the first parameter named `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns every parameter, decoded, in order.
    fn params(&self) -> Vec<(String, String)>;

    /// Sets (`Some`) or removes (`None`) each named parameter.
    ///
    /// Parameters not named are kept exactly as they are.
    fn update(&self, changes: &[(&str, Option<&str>)]);
}

/// [`QueryStore`] backed by a [`Url`].
///
/// Every update is published on a watch channel so that a screen can
/// refetch whenever the query changes.
#[derive(Debug)]
pub struct UrlQueryStore {
    sender: watch::Sender<Url>,
}

impl UrlQueryStore {
    /// Creates a store holding `url`.
    pub fn new(url: Url) -> Self {
        let (sender, _) = watch::channel(url);
        Self { sender }
    }

    /// Parses `url` and creates a store holding it.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            Error::validation()
                .with_message(format!("invalid listing URL: {e}"))
                .with_source(e)
        })?;

        Ok(Self::new(url))
    }

    /// Returns the current URL.
    pub fn url(&self) -> Url {
        self.sender.borrow().clone()
    }

    /// Subscribes to URL changes.
    pub fn subscribe(&self) -> watch::Receiver<Url> {
        self.sender.subscribe()
    }
}

impl QueryStore for UrlQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.sender
            .borrow()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn params(&self) -> Vec<(String, String)> {
        self.sender.borrow().query_pairs().into_owned().collect()
    }

    fn update(&self, changes: &[(&str, Option<&str>)]) {
        self.sender.send_if_modified(|url| {
            let mut query = url.query().map(str::to_owned);
            for (key, value) in changes {
                query = rewrite_query(query.as_deref(), key, *value);
            }

            if query.as_deref() == url.query() {
                return false;
            }

            url.set_query(query.as_deref());
            true
        });
    }
}

/// Returns the decoded key of a raw `key=value` query segment.
fn segment_key(segment: &str) -> Cow<'_, str> {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(key, _)| key)
        .unwrap_or(Cow::Borrowed(""))
}

/// Sets or removes one parameter in a raw query string.
///
/// Other segments are copied byte for byte, so their encoding and order
/// survive. A replaced parameter keeps its position; a new one is appended.
fn rewrite_query(query: Option<&str>, key: &str, value: Option<&str>) -> Option<String> {
    let encoded = value.map(|value| {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(key, value)
            .finish()
    });

    let mut replaced = false;
    let mut segments: Vec<String> = Vec::new();

    let query = query.unwrap_or_default();
    let existing = (!query.is_empty()).then(|| query.split('&'));

    for segment in existing.into_iter().flatten() {
        // Empty segments (`a=1&&b=2`) are kept as they are.
        if segment.is_empty() || segment_key(segment) != key {
            segments.push(segment.to_owned());
            continue;
        }

        // Duplicates of the rewritten key are dropped.
        if let (Some(encoded), false) = (&encoded, replaced) {
            segments.push(encoded.clone());
            replaced = true;
        }
    }

    if let (Some(encoded), false) = (encoded, replaced) {
        segments.push(encoded);
    }

    (!segments.iter().all(String::is_empty)).then(|| segments.join("&"))
}
