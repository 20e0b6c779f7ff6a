//! Asset-return fetching: an abstraction over "however a [`Table`] of
//! returns was obtained", plus an HTTP implementation behind the
//! `http-fetch` feature.

use crate::error::Result;
use crate::table::Table;

/// A source of asset returns, keyed by asset identifier.
pub trait ReturnsSource {
    /// Fetches an aligned [`Table`] of returns for the requested assets, one
    /// column per identifier in the order given.
    fn fetch(&self, asset_ids: &[&str]) -> Result<Table>;
}

#[cfg(feature = "http-fetch")]
mod http {
    use super::*;
    use crate::error::Error;
    use crate::persistence::ReturnsTable;

    /// Fetches returns from a remote `/api/returns` endpoint.
    pub struct HttpReturnsSource {
        base_url: String,
        client: reqwest::blocking::Client,
    }

    impl HttpReturnsSource {
        /// Builds a source pointed at `base_url` (e.g. `https://example.com`).
        pub fn new(base_url: impl Into<String>) -> Self {
            HttpReturnsSource {
                base_url: base_url.into(),
                client: reqwest::blocking::Client::new(),
            }
        }
    }

    impl ReturnsSource for HttpReturnsSource {
        fn fetch(&self, asset_ids: &[&str]) -> Result<Table> {
            let mut url = format!("{}/api/returns?", self.base_url);
            for id in asset_ids {
                url.push_str("asset-id=");
                url.push_str(id);
                url.push('&');
            }
            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| Error::DecodeFailure(e.to_string()))?;
            let wire: ReturnsTable = response
                .json()
                .map_err(|e| Error::DecodeFailure(e.to_string()))?;
            wire.into_table()
        }
    }
}

#[cfg(feature = "http-fetch")]
pub use http::HttpReturnsSource;

#[cfg(all(test, feature = "http-fetch"))]
mod tests {
    use super::*;

    #[test]
    fn constructs_without_panicking() {
        let _source = HttpReturnsSource::new("https://example.test");
    }
}
