use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use super::{AnalysisClient, AnalysisRequest, ClientError, ExtractionClient, ExtractionRequest};
use crate::config::AiConfig;
use crate::entities::measurement::ExtractedMeasurement;

/// Client for the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: AiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a client; the request timeout comes from `config.timeout`
    pub fn new(config: AiConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    async fn generate(
        &self,
        prompt: String,
        generation_config: Option<GenerationConfig>,
    ) -> Result<String, ClientError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ClientError::NotConfigured(
                "set GEMINI_API_KEY to enable analysis and import".to_string(),
            ));
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        debug!("Calling {} ({} prompt chars)", url, prompt.chars().count());

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            error!("Text generation failed with {}: {}", status, message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        response_text(parsed)
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<String, ClientError> {
        let prompt = build_analysis_prompt(&request)?;
        self.generate(prompt, None).await
    }
}

#[async_trait]
impl ExtractionClient for GeminiClient {
    async fn extract(&self, request: ExtractionRequest) -> Result<Vec<ExtractedMeasurement>, ClientError> {
        let prompt = build_extraction_prompt(&request);
        let config = GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: extraction_schema(),
        };

        let text = self.generate(prompt, Some(config)).await?;
        parse_extraction_text(&text)
    }
}

fn build_analysis_prompt(request: &AnalysisRequest) -> Result<String, ClientError> {
    let records = serde_json::to_string(&request.records)
        .map_err(|e| ClientError::InvalidResponse(format!("Failed to encode records: {}", e)))?;
    Ok(format!("{}\n\n{}", request.instruction, records))
}

fn build_extraction_prompt(request: &ExtractionRequest) -> String {
    format!(
        "你是一个专业的医疗数据提取助手。请从用户提供的这段文本中解析出血压测量记录。\n\n\
         用户输入：\n\"\"\"\n{text}\n\"\"\"\n\n\
         规则：\n\
         1. 提取内容：日期时间、收缩压(SYS)、舒张压(DIA)、心率/脉搏(HR)、手臂(左手/右手/未指定)、备注。\n\
         2. 时间处理：如果只有月日没写年份，默认使用 {year} 年。\n\
         3. 备注提取：除了数值和部位之外的描述都放入备注字段。\n\
         4. 输出：必须输出有效的 JSON 数组。\n\
         5. 字段名：timestamp(ISO格式), systolic, diastolic, heartRate, arm(只能是'左手','右手'或'未指定'), note。",
        text = request.text,
        year = request.current_year,
    )
}

fn extraction_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "timestamp": { "type": "STRING" },
                "systolic": { "type": "NUMBER" },
                "diastolic": { "type": "NUMBER" },
                "heartRate": { "type": "NUMBER" },
                "arm": { "type": "STRING" },
                "note": { "type": "STRING" }
            },
            "required": ["timestamp", "systolic", "diastolic", "heartRate", "arm", "note"]
        }
    })
}

fn response_text(response: GenerateContentResponse) -> Result<String, ClientError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        warn!("Text generation returned no text");
        return Err(ClientError::EmptyResponse);
    }

    Ok(text)
}

/// Decode the JSON array produced by an extraction call. A surrounding
/// markdown code fence is tolerated.
fn parse_extraction_text(text: &str) -> Result<Vec<ExtractedMeasurement>, ClientError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_carries_year_and_text() {
        let prompt = build_extraction_prompt(&ExtractionRequest {
            text: "3月5日 早上 左手 135/88 心率72".to_string(),
            current_year: 2025,
        });

        assert!(prompt.contains("2025 年"));
        assert!(prompt.contains("135/88"));
    }

    #[test]
    fn test_parse_plain_and_fenced_arrays() {
        let raw = r#"[{"timestamp":"2025-03-05T07:00:00","systolic":135,"diastolic":88,"heartRate":72,"arm":"左手","note":""}]"#;

        let plain = parse_extraction_text(raw).unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].systolic, 135.0);

        let fenced = parse_extraction_text(&format!("```json\n{}\n```", raw)).unwrap();
        assert_eq!(fenced, plain);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_extraction_text(r#"{"records":[]}"#),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(parse_extraction_text("sorry, I cannot help").is_err());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "## 总结\n" }, { "text": "血压平稳" }] } }]
        }))
        .unwrap();

        assert_eq!(response_text(response).unwrap(), "## 总结\n血压平稳");
    }

    #[test]
    fn test_response_without_text_is_empty_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(response_text(response), Err(ClientError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = GeminiClient::new(AiConfig::default()).unwrap();
        let result = client
            .analyze(AnalysisRequest {
                records: Vec::new(),
                instruction: "analyze".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ClientError::NotConfigured(_))));
    }
}
