use core::time::Duration;

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use types::primitives::{Slot, UnixSeconds};
use url::Url;

use crate::{
    containers::{BlockHeaderData, Committee, EthResponse, ForkChoiceContext, Genesis, HeadHeader},
    error::Error,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BeaconApiClient {
    client: Client,
    base_url: Url,
}

impl BeaconApiClient {
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub async fn genesis_time(&self) -> Result<UnixSeconds, Error> {
        let genesis = self
            .get::<EthResponse<Genesis>>("eth/v1/beacon/genesis")
            .await?
            .data;

        Ok(genesis.genesis_time)
    }

    pub async fn head_header(&self) -> Result<HeadHeader, Error> {
        let header = self
            .get::<EthResponse<BlockHeaderData>>("eth/v1/beacon/headers/head")
            .await?
            .data;

        Ok(HeadHeader {
            root: header.root,
            slot: header.header.message.slot,
        })
    }

    pub async fn fork_choice_context(&self) -> Result<ForkChoiceContext, Error> {
        self.get("eth/v1/debug/fork_choice").await
    }

    /// Returns the number of validators assigned to attest in `slot`.
    ///
    /// Beacon nodes answer with an empty committee list when their fork choice
    /// data does not cover the slot yet, which happens when querying right
    /// after an epoch transition. That case is reported as
    /// [`Error::ForkChoiceNotUpdated`] so that callers can re-query.
    pub async fn committee_size(&self, slot: Slot) -> Result<u64, Error> {
        let mut url = self.url("eth/v1/beacon/states/head/committees")?;

        url.query_pairs_mut()
            .append_pair("slot", &slot.to_string());

        let committees = self
            .request_json::<EthResponse<Vec<Committee>>>(url)
            .await?
            .data;

        let committee_size = committees
            .iter()
            .map(|committee| committee.validators.len())
            .sum::<usize>();

        if committee_size == 0 {
            return Err(Error::ForkChoiceNotUpdated { slot });
        }

        Ok(u64::try_from(committee_size).expect("committee size should fit in u64"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;

        self.request_json(url).await
    }

    async fn request_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(Error::HttpStatus { url, status, body });
        }

        response
            .json()
            .await
            .map_err(|source| Error::Decode { url, source })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|source| Error::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }
}
