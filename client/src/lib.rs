//! Fetches components and memberships from smd.

mod http;

use smd_core::{
    Component, Error, FilterSpec, Memberships, Result, parse_components, parse_groups,
    parse_partitions,
};
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

pub const COMPONENTS_PATH: &str = "hsm/v2/State/Components";
pub const PARTITIONS_PATH: &str = "hsm/v2/partitions";
pub const GROUPS_PATH: &str = "hsm/v2/groups";

/// Everything one inventory build needs from smd.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub components: Vec<Component>,
    pub memberships: Memberships,
}

#[derive(Clone, Debug)]
pub struct SmdClient {
    base: Url,
    http: HttpClient,
}

impl SmdClient {
    /// Creates a client for the smd instance at `base`.
    ///
    /// Endpoint paths are resolved relative to `base`, so a gateway prefix such
    /// as `https://api.example.com/apis/smd` is preserved.
    pub fn new(mut base: Url) -> Result<Self> {
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "smd server `{base}` must be an http or https URL"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self {
            base,
            http: HttpClient::new()?,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request when set.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.http.set_token(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.is_authenticated()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|err| {
            Error::configuration(format!("cannot build `{path}` from `{}`: {err}", self.base))
        })
    }

    pub fn components_url(&self, filter: &FilterSpec) -> Result<Url> {
        let mut url = self.endpoint(COMPONENTS_PATH)?;
        filter.apply_to(&mut url);
        Ok(url)
    }

    pub async fn fetch_components(&self, filter: &FilterSpec) -> Result<Vec<Component>> {
        filter.validate()?;
        let url = self.components_url(filter)?;
        let body = self.http.get_text(&url).await?;
        let components = parse_components(&body)?;
        debug!(count = components.len(), "fetched components");
        Ok(components)
    }

    pub async fn fetch_memberships(&self) -> Result<Memberships> {
        let body = self.http.get_text(&self.endpoint(PARTITIONS_PATH)?).await?;
        let partitions = parse_partitions(&body)?;
        let body = self.http.get_text(&self.endpoint(GROUPS_PATH)?).await?;
        let groups = parse_groups(&body)?;
        debug!(
            partitions = partitions.len(),
            groups = groups.len(),
            "fetched memberships"
        );
        Ok(Memberships::new(partitions, groups))
    }

    /// Fetches components, then memberships. The first failure is returned as is.
    pub async fn fetch(&self, filter: &FilterSpec) -> Result<Snapshot> {
        let components = self.fetch_components(filter).await?;
        let memberships = self.fetch_memberships().await?;
        Ok(Snapshot {
            components,
            memberships,
        })
    }
}
