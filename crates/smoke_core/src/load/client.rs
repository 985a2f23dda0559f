//! Blocking client for the provisioning services and WDS.

use super::readiness::{find_app, AppKind, AppState};
use crate::error::{Result, SmokeError};
use crate::records::Record;
use crate::url::build_url;
use rand::Rng;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::Url;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const RECORDS_VERSION: &str = "v0.2";

/// Base URLs of the services a load run talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    /// Workspace Manager.
    pub workspace_manager: String,
    /// Rawls (workspace creation).
    pub rawls: String,
    /// Leonardo (app provisioning).
    pub leonardo: String,
}

impl ServiceUrls {
    /// URLs of a BEE environment.
    pub fn for_bee(bee_name: &str) -> Self {
        Self {
            workspace_manager: format!("https://workspace.{}.bee.envs-terra.bio", bee_name),
            rawls: format!("https://rawls.{}.bee.envs-terra.bio", bee_name),
            leonardo: format!("https://leonardo.{}.bee.envs-terra.bio", bee_name),
        }
    }
}

/// Authenticated client for one load run.
pub struct LoadClient {
    client: Client,
    urls: ServiceUrls,
    token: String,
}

impl LoadClient {
    pub fn new(urls: ServiceUrls, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cwds-load/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, urls, token))
    }

    pub fn with_client(client: Client, urls: ServiceUrls, token: impl Into<String>) -> Self {
        Self {
            client,
            urls,
            token: token.into(),
        }
    }

    pub fn urls(&self) -> &ServiceUrls {
        &self.urls
    }

    /// Lists workspaces in Workspace Manager and returns the status code.
    pub fn probe_workspace_manager(&self) -> Result<u16> {
        let url = build_url(&self.urls.workspace_manager, "/api/workspaces/v1")?;
        let response = self.authed(self.client.get(url)).send()?;
        Ok(response.status().as_u16())
    }

    /// Creates a workspace in `billing_project` and returns its id.
    pub fn create_workspace(&self, billing_project: &str) -> Result<String> {
        let url = build_url(&self.urls.rawls, "/api/workspaces")?;
        let body = json!({
            "namespace": billing_project,
            "name": workspace_name(),
            "attributes": {},
        });

        let created = expect_json(
            self.authed(self.client.post(url)).json(&body).send()?,
            "workspace creation",
        )?;
        let workspace_id = created
            .get("workspaceId")
            .and_then(Value::as_str)
            .ok_or_else(|| SmokeError::UnexpectedStatus {
                context: "workspace creation".to_string(),
                status: 200,
                body: format!("no workspaceId in {}", created),
            })?;

        info!(workspace_id, "created workspace");
        Ok(workspace_id.to_string())
    }

    /// Requests a CROMWELL app (which hosts CBAS) in the workspace.
    pub fn request_cbas(&self, workspace_id: &str) -> Result<()> {
        let path = format!("/api/apps/v2/{}/terra-app-{}", workspace_id, Uuid::new_v4());
        let url = build_url(&self.urls.leonardo, &path)?;
        let response = self
            .authed(self.client.post(url))
            .json(&json!({ "appType": AppKind::Cbas.app_type() }))
            .send()?;
        expect_success(response, "CBAS app request").map(|_| ())
    }

    /// Current state of `kind` in the workspace.
    pub fn app_state(&self, workspace_id: &str, kind: AppKind) -> Result<AppState> {
        let path = format!("/api/apps/v2/{}?includeDeleted=false", workspace_id);
        let url = build_url(&self.urls.leonardo, &path)?;
        let response = self
            .authed(self.client.get(url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;
        let apps = expect_json(response, "app listing")?;
        Ok(find_app(&apps, kind))
    }

    /// Uploads a TSV file as `record_type` into the workspace's WDS.
    pub fn upload_tsv(
        &self,
        wds_url: &str,
        workspace_id: &str,
        record_type: &str,
        tsv: &Path,
    ) -> Result<Value> {
        let path = format!("/{}/tsv/{}/{}", workspace_id, RECORDS_VERSION, record_type);
        let url = app_url(wds_url, &path)?;
        let form = multipart::Form::new().file("records", tsv)?;
        let response = self.authed(self.client.post(url)).multipart(form).send()?;
        let uploaded = expect_json(response, "TSV upload")?;
        debug!(workspace_id, record_type, %uploaded, "uploaded TSV");
        Ok(uploaded)
    }

    /// Writes a record, replacing any existing one with the same id.
    pub fn put_record(&self, wds_url: &str, workspace_id: &str, record: &Record) -> Result<()> {
        let url = app_url(wds_url, &record_path(workspace_id, record))?;
        let response = self
            .authed(self.client.put(url))
            .json(&record.request_body())
            .send()?;
        expect_success(response, "record write").map(|_| ())
    }

    /// Reads a record back as raw JSON.
    pub fn get_record(&self, wds_url: &str, workspace_id: &str, record: &Record) -> Result<Value> {
        let url = app_url(wds_url, &record_path(workspace_id, record))?;
        expect_json(self.authed(self.client.get(url)).send()?, "record read")
    }

    /// Posts the run-set request in `request` to CBAS.
    pub fn submit_workflow(&self, cbas_url: &str, request: &Path) -> Result<Value> {
        let body = fs::read_to_string(request)?;
        let url = app_url(cbas_url, "/api/batch/v1/run_sets")?;
        let response = self
            .authed(self.client.post(url))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;
        expect_json(response, "workflow submission")
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

/// Appends `path` to an app's proxy URL, keeping the proxy's own path prefix.
fn app_url(proxy_url: &str, path: &str) -> Result<Url> {
    let base = format!("{}/", proxy_url.trim_end_matches('/'));
    build_url(&base, path.trim_start_matches('/'))
}

fn record_path(workspace_id: &str, record: &Record) -> String {
    format!(
        "/{}/records/{}/{}/{}",
        workspace_id, RECORDS_VERSION, record.record_type, record.id
    )
}

/// `api-workspace-` plus five random lowercase letters.
pub fn workspace_name() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    format!("api-workspace-{}", suffix)
}

fn expect_success(response: Response, context: &str) -> Result<String> {
    let status = response.status();
    let body = response.text()?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(SmokeError::UnexpectedStatus {
            context: context.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

fn expect_json(response: Response, context: &str) -> Result<Value> {
    let body = expect_success(response, context)?;
    Ok(serde_json::from_str(&body)?)
}
