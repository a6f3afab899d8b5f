use std::{error::Error as _, fmt};

use reqwest::StatusCode;
use smd_core::{Error, Result};
use tracing::debug;
use url::Url;

/// Thin GET wrapper that maps transport and status failures onto [`Error`].
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|err| {
            Error::configuration(format!("failed to build http client: {}", describe(&err)))
        })?;
        Ok(Self {
            client,
            token: None,
        })
    }

    pub(crate) fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Issues one GET and returns the body of a 2xx response.
    pub(crate) async fn get_text(&self, url: &Url) -> Result<String> {
        debug!(%url, authenticated = self.token.is_some(), "querying smd");
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await.map_err(|err| connection(url, &err))?;
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = res.text().await.map_err(|err| connection(url, &err))?;
        debug!(%url, bytes = body.len(), "smd responded");
        Ok(body)
    }
}

fn connection(url: &Url, err: &reqwest::Error) -> Error {
    Error::Connection {
        url: url.to_string(),
        message: describe(err),
    }
}

/// reqwest's top-level message hides the cause (refused, DNS, TLS); append the chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
