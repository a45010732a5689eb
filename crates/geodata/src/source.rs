use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::error::GeoError;
use crate::filter::LayerFilter;
use crate::model::{LayerContent, LayerData, LayerInfo};
use crate::resolution::Resolution;
use crate::wire::ShapesResponse;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote source of spatial data.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait GeoSource: Send + Sync {
    /// Fetch shapes for an optional resolution and key set.
    ///
    /// Keys are sent as given; callers are responsible for any truncation
    /// or deduplication before the request.
    fn fetch_shapes<'a>(
        &'a self,
        resolution: Option<Resolution>,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<LayerData, GeoError>>;

    /// List the layers the source offers. `Ok(None)` if the source has none.
    fn available_layers(&self) -> BoxFuture<'_, Result<Option<Vec<LayerInfo>>, GeoError>>;

    /// Metadata for one layer. `Ok(None)` for an unknown layer (404 equivalent).
    fn layer_info<'a>(
        &'a self,
        layer: &'a str,
    ) -> BoxFuture<'a, Result<Option<LayerInfo>, GeoError>>;

    /// Contents of one layer, optionally narrowed by `filter`.
    ///
    /// `Ok(None)` for an unknown layer (404 equivalent).
    fn layer_contents<'a>(
        &'a self,
        layer: &'a str,
        filter: Option<&'a LayerFilter>,
    ) -> BoxFuture<'a, Result<Option<Vec<LayerContent>>, GeoError>>;
}

/// `GeoSource` over the geo-data REST API.
pub struct HttpGeoSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGeoSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn transport_err(e: reqwest::Error) -> GeoError {
    GeoError::RemoteUnavailable(e.to_string())
}

fn decode_err(e: reqwest::Error) -> GeoError {
    GeoError::Decode(e.to_string())
}

impl GeoSource for HttpGeoSource {
    fn fetch_shapes<'a>(
        &'a self,
        resolution: Option<Resolution>,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<LayerData, GeoError>> {
        Box::pin(async move {
            let mut query: Vec<(&str, &str)> = Vec::new();
            if let Some(res) = resolution {
                query.push(("resolution", res.as_str()));
            }
            for key in keys {
                query.push(("key", key));
            }

            debug!(resolution = ?resolution, keys = keys.len(), "requesting shapes");
            let response = self
                .http
                .get(self.url(""))
                .query(&query)
                .send()
                .await
                .map_err(transport_err)?;

            let status = response.status();
            if !status.is_success() {
                return Err(GeoError::UnexpectedStatus {
                    status: status.as_u16(),
                });
            }

            let raw: ShapesResponse = response.json().await.map_err(decode_err)?;
            Ok(raw.into())
        })
    }

    fn available_layers(&self) -> BoxFuture<'_, Result<Option<Vec<LayerInfo>>, GeoError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(self.url(""))
                .send()
                .await
                .map_err(transport_err)?;

            match response.status().as_u16() {
                200 => {
                    let layers = response.json().await.map_err(decode_err)?;
                    Ok(Some(layers))
                }
                204 => Ok(None),
                status => Err(GeoError::UnexpectedStatus { status }),
            }
        })
    }

    fn layer_info<'a>(
        &'a self,
        layer: &'a str,
    ) -> BoxFuture<'a, Result<Option<LayerInfo>, GeoError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(self.url(layer))
                .send()
                .await
                .map_err(transport_err)?;

            let status = response.status();
            if status.as_u16() == 404 {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(GeoError::UnexpectedStatus {
                    status: status.as_u16(),
                });
            }

            let info = response.json().await.map_err(decode_err)?;
            Ok(Some(info))
        })
    }

    fn layer_contents<'a>(
        &'a self,
        layer: &'a str,
        filter: Option<&'a LayerFilter>,
    ) -> BoxFuture<'a, Result<Option<Vec<LayerContent>>, GeoError>> {
        Box::pin(async move {
            let url = self.url(&format!("content/{layer}"));
            let request = match filter {
                // Filtered lookups POST the filter as the request body.
                Some(filter) => self.http.post(url).json(filter),
                None => self.http.get(url),
            };

            debug!(layer, filtered = filter.is_some(), "requesting layer contents");
            let response = request.send().await.map_err(transport_err)?;

            let status = response.status();
            if status.as_u16() == 404 {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(GeoError::UnexpectedStatus {
                    status: status.as_u16(),
                });
            }

            let contents = response.json().await.map_err(decode_err)?;
            Ok(Some(contents))
        })
    }
}
