//! Authenticated HTTP session shared by the controller adapters.
//!
//! The session logs in once (basic auth → `X-Auth-Token`) and then issues
//! blocking JSON requests. Request and response bodies are logged at
//! `trace` level only.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use templar_core::config::Credentials;
use templar_core::{ProjectName, TaskId, TaskStatus, TemplateId, TemplateRecord};

use crate::error::ControllerError;
use crate::wire::{parse_task_handle, parse_task_status, parse_token};

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const TEMPLATE_API: &str = "/dna/intent/api/v1/template-programmer";
const TASK_API: &str = "/dna/intent/api/v1/task";
const TOKEN_HEADER: &str = "X-Auth-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A logged-in connection to one controller.
pub struct Session {
    agent: ureq::Agent,
    base_url: String,
    token: SecretString,
}

impl Session {
    /// Authenticate against `base_url` and keep the issued token.
    pub fn login(base_url: &str, credentials: &Credentials) -> Result<Self, ControllerError> {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        let base_url = base_url.trim_end_matches('/').to_string();

        let basic = STANDARD.encode(format!(
            "{}:{}",
            credentials.username,
            credentials.password.expose_secret()
        ));
        let response = agent
            .post(&format!("{base_url}{AUTH_PATH}"))
            .set("Authorization", &format!("Basic {basic}"))
            .set("Content-Type", "application/json")
            .call();
        let body = read_json(AUTH_PATH, response)?;
        let token = parse_token(AUTH_PATH, &body)?;

        tracing::info!("authenticated to {base_url} as {}", credentials.username);
        Ok(Self {
            agent,
            base_url,
            token: SecretString::from(token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> Result<Value, ControllerError> {
        tracing::trace!("GET {path}");
        let response = self
            .agent
            .get(&format!("{}{path}", self.base_url))
            .set(TOKEN_HEADER, self.token.expose_secret())
            .call();
        read_json(path, response)
    }

    pub(crate) fn post(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, ControllerError> {
        tracing::trace!("POST {path} {body}");
        let mut request = self
            .agent
            .post(&format!("{}{path}", self.base_url))
            .set(TOKEN_HEADER, self.token.expose_secret());
        for (name, value) in query {
            request = request.query(name, value);
        }
        read_json(path, request.send_json(body))
    }

    // -----------------------------------------------------------------------
    // Endpoints common to both API flavors
    // -----------------------------------------------------------------------

    pub(crate) fn export_templates(&self, ids: &[TemplateId]) -> Result<TaskId, ControllerError> {
        let path = format!("{TEMPLATE_API}/template/name/exportTemplates");
        let ids: Vec<&str> = ids.iter().map(|id| id.0.as_str()).collect();
        let body = self.post(&path, &[], &json!(ids))?;
        parse_task_handle(&path, &body)
    }

    pub(crate) fn import_templates(
        &self,
        project: &ProjectName,
        templates: &[TemplateRecord],
    ) -> Result<TaskId, ControllerError> {
        let path = import_path(project);
        let payload = Value::Array(templates.iter().map(TemplateRecord::to_value).collect());
        let body = self.post(&path, &[("doVersion", "false")], &payload)?;
        parse_task_handle(&path, &body)
    }

    pub(crate) fn create_project(&self, name: &ProjectName) -> Result<TaskId, ControllerError> {
        let path = format!("{TEMPLATE_API}/project");
        let body = self.post(&path, &[], &json!({ "name": name.0 }))?;
        parse_task_handle(&path, &body)
    }

    pub(crate) fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, ControllerError> {
        let path = task_path(task_id);
        let body = self.get(&path)?;
        parse_task_status(&path, body)
    }
}

fn import_path(project: &ProjectName) -> String {
    format!(
        "{TEMPLATE_API}/project/name/{}/template/importtemplates",
        urlencoding::encode(&project.0)
    )
}

fn task_path(task_id: &TaskId) -> String {
    format!("{TASK_API}/{}", urlencoding::encode(&task_id.0))
}

fn read_json(
    endpoint: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<Value, ControllerError> {
    match result {
        Ok(response) => {
            let body: Value = response
                .into_json()
                .map_err(|source| ControllerError::Body {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            tracing::trace!("{endpoint} -> {body}");
            Ok(body)
        }
        Err(ureq::Error::Status(status, response)) => Err(ControllerError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(transport)) => Err(ControllerError::Transport {
            endpoint: endpoint.to_string(),
            detail: transport.to_string(),
        }),
    }
}
