use reqwest::header::{self, HeaderValue};
use reqwest::{Response, StatusCode, Url};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CoreError, RpcError};

use super::connection::{ConnectionDescriptor, Credentials};
use super::digest::DigestChallenge;
use super::protocol::RpcRequest;

/// Last accepted challenge and the nonce count already spent on it.
#[derive(Debug)]
struct CachedChallenge {
    challenge: DigestChallenge,
    nonce_count: u32,
}

/// HTTP exchange against one [`ConnectionDescriptor`], answering digest
/// challenges when credentials are configured.
///
/// A single network failure is returned as-is; the only second exchange ever
/// issued is the response to a fresh 401 challenge.
#[derive(Debug)]
pub(super) struct AuthenticatedTransport {
    client: reqwest::Client,
    connection: ConnectionDescriptor,
    challenge: Mutex<Option<CachedChallenge>>,
}

impl AuthenticatedTransport {
    pub(super) fn new(client: reqwest::Client, connection: ConnectionDescriptor) -> Self {
        Self {
            client,
            connection,
            challenge: Mutex::new(None),
        }
    }

    pub(super) fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    /// Send `request` and return the raw response, whatever its status.
    pub(super) async fn send(&self, request: &RpcRequest) -> Result<Response, CoreError> {
        let url = self.request_url(request.path)?;

        let Some(credentials) = self.connection.credentials() else {
            return self.exchange(request, &url, None).await;
        };
        let digest_uri = digest_uri(&url);
        let verb = request.method.as_str();

        let preemptive = {
            let mut cached = self.challenge.lock().await;
            next_authorization(&mut cached, credentials, verb, &digest_uri)
        };
        let reused = preemptive.is_some();

        let response = self.exchange(request, &url, preemptive).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let offered = DigestChallenge::select(
            response
                .headers()
                .get_all(header::WWW_AUTHENTICATE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        let Some(challenge) = offered else {
            debug!(rpc.path = request.path, "401 without a usable digest challenge");
            self.challenge.lock().await.take();
            return Ok(response);
        };
        debug!(
            rpc.path = request.path,
            reused_challenge = reused,
            "answering digest challenge"
        );

        let authorization = challenge.authorize(credentials, verb, &digest_uri, 1);
        *self.challenge.lock().await = Some(CachedChallenge {
            challenge,
            nonce_count: 1,
        });

        let response = self.exchange(request, &url, Some(authorization)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(rpc.path = request.path, "digest credentials rejected");
            self.challenge.lock().await.take();
        }
        Ok(response)
    }

    fn request_url(&self, path: &str) -> Result<Url, CoreError> {
        let endpoint = self.connection.endpoint(path);
        Url::parse(&endpoint).map_err(|e| CoreError::InvalidAddress {
            address: endpoint,
            reason: e.to_string(),
        })
    }

    async fn exchange(
        &self,
        request: &RpcRequest,
        url: &Url,
        authorization: Option<String>,
    ) -> Result<Response, CoreError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(body) = &request.body {
            builder = builder
                .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body.clone());
        }
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        builder
            .send()
            .await
            .map_err(|e| CoreError::Rpc(RpcError::from_reqwest(e)))
    }
}

/// Spend the next nonce count on the cached challenge. An exhausted counter
/// drops the challenge so the server issues a fresh nonce.
fn next_authorization(
    cached: &mut Option<CachedChallenge>,
    credentials: &Credentials,
    verb: &str,
    digest_uri: &str,
) -> Option<String> {
    if cached
        .as_ref()
        .is_some_and(|entry| entry.nonce_count == u32::MAX)
    {
        cached.take();
    }
    cached.as_mut().map(|entry| {
        entry.nonce_count += 1;
        entry
            .challenge
            .authorize(credentials, verb, digest_uri, entry.nonce_count)
    })
}

/// Request-target as it appears in the digest `uri` parameter.
fn digest_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}
