//! REST implementation of the chassis client.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::api::ChassisClient;
use crate::error::{ClientError, ClientResult};
use crate::types::{ClientConfig, Interface, Server, System};

/// API versions this client speaks.
pub const SUPPORTED_API_VERSIONS: &[&str] = &["2"];

/// HTTP client for one chassis switch.
///
/// Built once per configured switch and held for the lifetime of the
/// driver. The API version is checked at construction; an unrecognized
/// version is fatal for that switch, there is no automatic downgrade.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
}

impl RestClient {
    /// Creates a client for the given switch.
    ///
    /// Fails with [`ClientError::UnsupportedVersion`] when the configured
    /// API version is not in [`SUPPORTED_API_VERSIONS`].
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        if !SUPPORTED_API_VERSIONS.contains(&config.api_version.as_str()) {
            return Err(ClientError::unsupported_version(
                &config.api_version,
                SUPPORTED_API_VERSIONS,
            ));
        }

        let endpoint = config.api_endpoint();
        debug!("Chassis client for {}", endpoint);

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Returns the versioned endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Sends a request and maps transport/auth/rejection outcomes onto
    /// [`ClientError`]. Returns the raw response for the caller to decode.
    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &str,
        url: &str,
    ) -> ClientResult<Response> {
        let response = builder.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::AuthFailed {
                endpoint: self.endpoint.clone(),
            }),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(ClientError::Rejected {
                    operation: operation.to_string(),
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, operation: &str) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.send(self.request(Method::GET, &url), operation, &url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::invalid_response(&url, e.to_string()))
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> ClientResult<()> {
        let url = self.url(path);
        let mut builder = self.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.send(builder, operation, &url).await?;
        Ok(())
    }
}

#[async_trait]
impl ChassisClient for RestClient {
    async fn list_systems(&self) -> ClientResult<Vec<System>> {
        self.get_json("systems", "list_systems").await
    }

    async fn add_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.mutate(
            Method::POST,
            &format!("systems/{system_id}/segments"),
            Some(json!({ "vlan_id": vlan_id })),
            "add_segment",
        )
        .await
    }

    async fn remove_segment(&self, system_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.mutate(
            Method::DELETE,
            &format!("systems/{system_id}/segments/{vlan_id}"),
            None,
            "remove_segment",
        )
        .await
    }

    async fn list_interfaces(&self) -> ClientResult<Vec<Interface>> {
        self.get_json("interfaces", "list_interfaces").await
    }

    async fn add_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.mutate(
            Method::POST,
            &format!("interfaces/{interface_id}/tagged_vlans"),
            Some(json!({ "vlan_id": vlan_id })),
            "add_tagged_vlan",
        )
        .await
    }

    async fn remove_tagged_vlan(&self, interface_id: &str, vlan_id: &str) -> ClientResult<()> {
        self.mutate(
            Method::DELETE,
            &format!("interfaces/{interface_id}/tagged_vlans/{vlan_id}"),
            None,
            "remove_tagged_vlan",
        )
        .await
    }

    async fn get_server(&self, server_id: &str) -> ClientResult<Server> {
        let url = self.url(&format!("servers/{server_id}"));
        let response = self
            .send(self.request(Method::GET, &url), "get_server", &url)
            .await;

        match response {
            Ok(response) => response
                .json::<Server>()
                .await
                .map_err(|e| ClientError::invalid_response(&url, e.to_string())),
            Err(ClientError::Rejected { status: 404, .. }) => {
                Err(ClientError::not_found("server", server_id))
            }
            Err(err) => Err(err),
        }
    }

    async fn set_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()> {
        let mut body = json!({ "vlan_id": vlan_id });
        if !nics.is_empty() {
            body["nics"] = json!(nics);
        }
        self.mutate(
            Method::POST,
            &format!("servers/{server_id}/tagged_vlans"),
            Some(body),
            "set_tagged_vlan",
        )
        .await
    }

    async fn unset_tagged_vlan(
        &self,
        server_id: &str,
        vlan_id: &str,
        nics: &[String],
    ) -> ClientResult<()> {
        let mut body = json!({ "vlan_id": vlan_id });
        if !nics.is_empty() {
            body["nics"] = json!(nics);
        }
        self.mutate(
            Method::DELETE,
            &format!("servers/{server_id}/tagged_vlans"),
            Some(body),
            "unset_tagged_vlan",
        )
        .await
    }
}
