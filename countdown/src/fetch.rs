use std::time::Duration;

use async_trait::async_trait;
use metals::{BootstrapData, PricePayload, REFRESH_ACTION};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::CountdownError;

/// Source of refresh payloads.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self) -> Result<PricePayload, CountdownError>;
}

/// Posts the refresh action to the server's ajax endpoint.
#[derive(Clone)]
pub struct HttpPriceFetcher {
    http: Client,
    ajax_url: String,
}

fn http_client() -> Result<Client, CountdownError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(5))
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .build()?)
}

fn check_url(url: &str) -> Result<(), CountdownError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(CountdownError::InvalidUrl(url.to_string()))
    }
}

impl HttpPriceFetcher {
    pub fn new(ajax_url: String) -> Result<Self, CountdownError> {
        check_url(&ajax_url)?;
        Ok(Self {
            http: http_client()?,
            ajax_url,
        })
    }

    pub fn ajax_url(&self) -> &str {
        &self.ajax_url
    }
}

#[async_trait]
impl PriceFetcher for HttpPriceFetcher {
    #[instrument(target = "countdown", skip(self), fields(url = %self.ajax_url), level = "debug")]
    async fn fetch(&self) -> Result<PricePayload, CountdownError> {
        let resp = self
            .http
            .post(&self.ajax_url)
            .form(&[("action", REFRESH_ACTION)])
            .send()
            .await?
            .error_for_status()?;

        let payload: PricePayload = resp.json().await?;

        debug!(
            target: "countdown",
            time_to_update = %payload.time_to_update,
            "price payload fetched"
        );

        Ok(payload)
    }
}

/// Loads the data a page would embed at render time.
#[instrument(target = "countdown", level = "debug")]
pub async fn fetch_bootstrap(server_url: &str) -> Result<BootstrapData, CountdownError> {
    let base = server_url.trim_end_matches('/');
    check_url(base)?;

    let data = http_client()?
        .get(format!("{base}/bootstrap"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(data)
}
