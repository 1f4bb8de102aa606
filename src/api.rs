//! 远程生成接口
//!
//! 三个端点：`GET /ai/providers`、`GET /ai/templates`、`POST /ai/generate`

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::{
    GenerationMetadata, GenerationReply, GenerationRequest, GenerationResult, Provider, Script,
    Template,
};

/// 生成服务的调用接口
pub trait ScriptApi: Send + Sync {
    fn fetch_providers(&self) -> Result<Vec<Provider>, ApiError>;
    fn fetch_templates(&self) -> Result<Vec<Template>, ApiError>;
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ProvidersEnvelope {
    #[serde(default)]
    providers: Vec<Provider>,
}

/// 模板逐条解析，单条格式错误不影响其余模板
#[derive(Debug, Deserialize)]
struct TemplatesEnvelope {
    #[serde(default)]
    templates: Vec<serde_json::Value>,
}

impl TemplatesEnvelope {
    fn into_templates(self) -> Vec<Template> {
        self.templates
            .into_iter()
            .filter_map(|raw| match Template::deserialize(&raw) {
                Ok(template) => Some(template),
                Err(e) => {
                    let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or("?");
                    warn!(template = id, error = %e, "skipping malformed template");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    #[serde(default)]
    success: bool,
    script: Option<Script>,
    metadata: Option<GenerationMetadata>,
    error: Option<String>,
}

impl GenerateEnvelope {
    /// 成功但缺少脚本内容视为响应格式错误
    fn into_reply(self) -> Result<GenerationReply, String> {
        if !self.success {
            return Ok(GenerationReply::Failure(self.error));
        }
        let script = self
            .script
            .ok_or_else(|| "response reported success without a script".to_string())?;
        Ok(GenerationReply::Success(GenerationResult::new(
            script,
            self.metadata.unwrap_or_default(),
        )))
    }
}

/// 基于 ureq 的 HTTP 实现
pub struct HttpScriptApi {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpScriptApi {
    /// `timeout` 为 `None` 时不限制请求时长
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        // 非 2xx 响应仍按正文解析，由调用方判断
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .into();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| ApiError::transport(&url, e))?;

        read_body(&url, response)
    }
}

fn read_body<T: DeserializeOwned>(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    response
        .into_body()
        .read_json::<T>()
        .map_err(|e| ApiError::decode(url, status, e))
}

impl ScriptApi for HttpScriptApi {
    fn fetch_providers(&self) -> Result<Vec<Provider>, ApiError> {
        let envelope: ProvidersEnvelope = self.get_json("/ai/providers")?;
        Ok(envelope.providers)
    }

    fn fetch_templates(&self) -> Result<Vec<Template>, ApiError> {
        let envelope: TemplatesEnvelope = self.get_json("/ai/templates")?;
        Ok(envelope.into_templates())
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ApiError> {
        let url = self.endpoint("/ai/generate");
        info!(
            %url,
            script_type = request.script_type.as_str(),
            complexity = request.complexity.as_str(),
            "submitting generation request"
        );

        let response = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .send_json(request)
            .map_err(|e| ApiError::transport(&url, e))?;

        let status = response.status().as_u16();
        let envelope: GenerateEnvelope = read_body(&url, response)?;
        envelope
            .into_reply()
            .map_err(|message| ApiError::decode(&url, status, message))
    }
}
