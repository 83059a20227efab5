//! HTTP implementation of the remote contact API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{debug, info, instrument};

use crate::errors::RemoteApiError;
use crate::models::{Client, ContactPayload, RemoteContact};
use crate::remote::RemoteApi;

/// Header carrying the static API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Asynchronous HTTP client for the remote contact API.
#[derive(Clone)]
pub struct HttpRemoteApi {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpRemoteApi {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("contactsync/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");
        info!(api_url = %api_url, "created HttpRemoteApi");
        Self {
            http,
            api_url,
            api_key,
        }
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), RemoteApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(RemoteApiError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        Err(RemoteApiError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    #[instrument(skip(self))]
    async fn find_contact_by_email(
        &self,
        email: &str,
    ) -> Result<Option<RemoteContact>, RemoteApiError> {
        let url = format!("{}/contacts", self.api_url);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("email", email)])
            .send()
            .await?;
        self.check_response(&resp)?;
        let mut matches: Vec<RemoteContact> = resp.json().await?;
        debug!(count = matches.len(), "looked up contact by email");
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.remove(0))),
            count => Err(RemoteApiError::AmbiguousEmail {
                email: email.to_string(),
                count,
            }),
        }
    }

    #[instrument(skip(self, payload))]
    async fn create_contact(
        &self,
        payload: &ContactPayload,
    ) -> Result<RemoteContact, RemoteApiError> {
        let url = format!("{}/contacts", self.api_url);
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await?;
        self.check_response(&resp)?;
        let contact: RemoteContact = resp.json().await?;
        info!(id = contact.id, email = %contact.email, "created remote contact");
        Ok(contact)
    }

    #[instrument(skip(self, payload))]
    async fn update_contact(
        &self,
        id: u64,
        payload: &ContactPayload,
    ) -> Result<RemoteContact, RemoteApiError> {
        let url = format!("{}/contacts/{}", self.api_url, id);
        let resp = self
            .http
            .put(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await?;
        if resp.status().as_u16() == 404 {
            return Err(RemoteApiError::ContactNotFound(id));
        }
        self.check_response(&resp)?;
        let contact: RemoteContact = resp.json().await?;
        info!(id = contact.id, "updated remote contact");
        Ok(contact)
    }

    #[instrument(skip(self))]
    async fn list_clients(&self) -> Result<Vec<Client>, RemoteApiError> {
        let url = format!("{}/clients", self.api_url);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        self.check_response(&resp)?;
        let clients: Vec<Client> = resp.json().await?;
        debug!(count = clients.len(), "fetched client list");
        Ok(clients)
    }
}
