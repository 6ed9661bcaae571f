use async_trait::async_trait;
use http_client::{HttpClient, Url};
use snafu::IntoError;
use tracing::instrument;
use tracking_core::{
    FetchError, FetchRequest, PositionSource, VesselPosition,
    fetch_error::{DecodeSnafu, PermissionDeniedSnafu, ServerSnafu, TransportSnafu},
};

use crate::models::{SnapshotResponse, validate_records};

/// Fetches bounds-scoped snapshots from the realtime positions endpoint.
#[derive(Debug, Clone)]
pub struct HttpPositionSource {
    client: HttpClient,
    url: Url,
    token: Option<String>,
}

impl HttpPositionSource {
    pub fn new(client: HttpClient, url: Url, token: Option<String>) -> Self {
        Self { client, url, token }
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    #[instrument(skip(self), fields(app.sequence = %request.sequence, app.num_vessels))]
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<VesselPosition>, FetchError> {
        let mut req = self
            .client
            .get(self.url.clone())
            .bearer(self.token.as_deref());

        // No bounds means a global query, which the endpoint defaults to.
        if let Some(bounds) = &request.bounds {
            req = req.query(bounds);
        }

        let body = req
            .send()
            .await
            .map_err(classify)?
            .bytes()
            .await
            .map_err(|e| TransportSnafu.into_error(e.into()))?;

        let response: SnapshotResponse =
            serde_json::from_slice(&body).map_err(|e| DecodeSnafu.into_error(e.into()))?;

        let vessels = validate_records(response.into_records(), request.bounds.as_ref());

        tracing::Span::current().record("app.num_vessels", vessels.len());

        Ok(vessels)
    }
}

fn classify(error: http_client::Error) -> FetchError {
    if let Some(status) = error.status().filter(|_| error.is_unauthorized()) {
        return PermissionDeniedSnafu {
            status: status.as_u16(),
        }
        .build();
    }
    if let (Some(status), Some(body)) = (error.status(), error.body()) {
        return ServerSnafu {
            status: status.as_u16(),
            body,
        }
        .build();
    }
    TransportSnafu.into_error(error.into())
}
