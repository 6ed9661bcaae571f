use http::header::AUTHORIZATION;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use snafu::ResultExt;

use crate::{
    Response, Result,
    error::{BodySnafu, FailedRequestSnafu, SendSnafu},
};

#[derive(Debug)]
pub struct RequestBuilder(pub(crate) reqwest_middleware::RequestBuilder);

impl RequestBuilder {
    pub fn json(self, json: &impl Serialize) -> Self {
        Self(self.0.json(json))
    }

    pub fn query(self, query: &impl Serialize) -> Self {
        Self(self.0.query(query))
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        Self(self.0.header(key, value))
    }

    /// Adds a bearer token when one is given, leaves the request untouched otherwise.
    pub fn bearer(self, token: Option<impl AsRef<str>>) -> Self {
        match token {
            Some(token) => self.header(AUTHORIZATION, format!("Bearer {}", token.as_ref())),
            None => self,
        }
    }

    /// Sends the request and turns every non-2xx status into [crate::Error::FailedRequest].
    pub async fn send(self) -> Result<Response> {
        let response = self.0.send().await.context(SendSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            return FailedRequestSnafu {
                url,
                status,
                body: response.text().await.context(BodySnafu)?,
            }
            .fail();
        }

        Ok(Response(response))
    }
}
