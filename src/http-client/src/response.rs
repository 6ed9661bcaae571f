use bytes::Bytes;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::{Result, error::BodySnafu};

#[derive(Debug)]
pub struct Response(pub(crate) reqwest::Response);

impl Response {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }

    pub fn url(&self) -> &Url {
        self.0.url()
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.0.json().await.context(BodySnafu)
    }

    pub async fn text(self) -> Result<String> {
        self.0.text().await.context(BodySnafu)
    }

    pub async fn bytes(self) -> Result<Bytes> {
        self.0.bytes().await.context(BodySnafu)
    }
}
