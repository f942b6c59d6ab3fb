//! REST client for the laboratory platform.
//!
//! One `reqwest::Client` is built at startup and shared; each invocation gets
//! a [`RestPlatform`] bound to the calling user's API URL and session token.
//! A request without a URL still connects: the handler only fails if it
//! actually touches the platform.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use webhook_core::platform::{
    AccessionManager, DataRecord, DataRecordManager, ElnEntryCriteria, ElnManager,
    EntryUpdateCriteria, ExperimentEntry, FieldMap, PlatformConnector, PlatformHandle,
    PlatformResult, UserSession,
};
use webhook_core::PlatformError;

use crate::config::WebhookConfig;

/// Header carrying the platform user's GUID.
pub const GUID_HEADER: &str = "X-Platform-Guid";

/// Longest error body echoed into a [`PlatformError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Opens [`RestPlatform`] sessions over a shared HTTP client.
pub struct RestConnector {
    client: Client,
    default_url: Option<String>,
}

impl RestConnector {
    pub fn new(config: &WebhookConfig) -> PlatformResult<Self> {
        if !config.verify_platform_cert {
            tracing::warn!("Platform TLS certificate verification is disabled");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_platform_cert)
            .timeout(config.platform_timeout())
            .build()
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        Ok(Self {
            client,
            default_url: config.platform_url.clone(),
        })
    }
}

impl PlatformConnector for RestConnector {
    fn connect(&self, user: Option<&UserSession>) -> PlatformResult<PlatformHandle> {
        let base_url = user
            .and_then(|u| u.url.clone())
            .or_else(|| self.default_url.clone())
            .map(|url| url.trim_end_matches('/').to_string());
        Ok(PlatformHandle::from_backend(RestPlatform {
            client: self.client.clone(),
            base_url,
            session_token: user.and_then(|u| u.session_token.clone()),
            guid: user.and_then(|u| u.guid.clone()),
        }))
    }
}

/// Platform ports over the REST API, scoped to one user.
pub struct RestPlatform {
    client: Client,
    base_url: Option<String>,
    session_token: Option<String>,
    guid: Option<String>,
}

impl RestPlatform {
    fn request(&self, method: Method, path: &str) -> PlatformResult<RequestBuilder> {
        let base = self.base_url.as_deref().ok_or(PlatformError::MissingEndpoint)?;
        let mut builder = self.client.request(method, format!("{}/{}", base, path));
        if let Some(token) = &self.session_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(guid) = &self.guid {
            builder = builder.header(GUID_HEADER, guid);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> PlatformResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> PlatformResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(method, path)?.json(body)).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    async fn send_unit<B>(&self, method: Method, path: &str, body: &B) -> PlatformResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(method, path)?.json(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl DataRecordManager for RestPlatform {
    async fn add_data_record(&self, data_type_name: &str) -> PlatformResult<DataRecord> {
        self.send_json(
            Method::POST,
            "datarecord/add",
            &json!({ "dataTypeName": data_type_name }),
        )
        .await
    }

    async fn add_data_records_with_data(
        &self,
        data_type_name: &str,
        field_maps: Vec<FieldMap>,
    ) -> PlatformResult<Vec<DataRecord>> {
        self.send_json(
            Method::POST,
            "datarecord/addwithdata",
            &json!({ "dataTypeName": data_type_name, "fieldMapList": field_maps }),
        )
        .await
    }

    async fn commit_data_records(&self, records: &[DataRecord]) -> PlatformResult<()> {
        self.send_unit(Method::POST, "datarecord/commit", records).await
    }
}

#[async_trait]
impl ElnManager for RestPlatform {
    async fn get_experiment_entry_list(
        &self,
        experiment_id: i64,
    ) -> PlatformResult<Vec<ExperimentEntry>> {
        self.get_json(&format!("eln/experiment/{}/entries", experiment_id))
            .await
    }

    async fn get_data_records_for_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<Vec<DataRecord>> {
        self.get_json(&format!(
            "eln/experiment/{}/entry/{}/records",
            experiment_id, entry_id
        ))
        .await
    }

    async fn add_experiment_entry(
        &self,
        experiment_id: i64,
        criteria: ElnEntryCriteria,
    ) -> PlatformResult<ExperimentEntry> {
        self.send_json(
            Method::POST,
            &format!("eln/experiment/{}/entries", experiment_id),
            &criteria,
        )
        .await
    }

    async fn update_experiment_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        update: EntryUpdateCriteria,
    ) -> PlatformResult<()> {
        self.send_unit(
            Method::PUT,
            &format!("eln/experiment/{}/entry/{}", experiment_id, entry_id),
            &update,
        )
        .await
    }

    async fn add_records_to_table_entry(
        &self,
        experiment_id: i64,
        entry_id: i64,
        records: &[DataRecord],
    ) -> PlatformResult<()> {
        let record_ids: Vec<i64> = records.iter().map(|r| r.record_id).collect();
        self.send_unit(
            Method::POST,
            &format!("eln/experiment/{}/entry/{}/records", experiment_id, entry_id),
            &record_ids,
        )
        .await
    }

    async fn get_experiment_entry_options(
        &self,
        experiment_id: i64,
        entry_id: i64,
    ) -> PlatformResult<BTreeMap<String, String>> {
        self.get_json(&format!(
            "eln/experiment/{}/entry/{}/options",
            experiment_id, entry_id
        ))
        .await
    }
}

#[async_trait]
impl AccessionManager for RestPlatform {
    async fn accession_with_config_list(
        &self,
        data_type_name: &str,
        data_field_name: &str,
        count: usize,
    ) -> PlatformResult<Vec<String>> {
        self.send_json(
            Method::POST,
            "accession/configlist",
            &json!({
                "dataTypeName": data_type_name,
                "dataFieldName": data_field_name,
                "count": count,
            }),
        )
        .await
    }
}
