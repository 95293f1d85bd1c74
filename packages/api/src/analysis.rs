//! # Diary analysis via an OpenAI-compatible chat completion endpoint
//!
//! [`ChatAnalyzer`] implements [`store::Analyzer`]: HTML content is flattened to
//! plain text, wrapped in [`PROMPT`] and sent as a single user message. The first
//! choice's message content is the analysis.

use serde::{Deserialize, Serialize};
use store::text::plain_text;
use store::{AnalysisError, Analyzer};

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "deepseek-r1";

/// Instruction prepended to the diary text.
pub const PROMPT: &str = r#"分析复盘内容，按步骤执行以下指令：
任务一：
使用5W1H模型分析用户 在哪里，扮演什么角色，在做什么的时候，表现出了怎样的特质或价值观，做了什么具体的事情，表现出了什么特质或价值观，以及会这样做表现出了用户怎样的行为逻辑和信念这样的一句话个人宪法。

任务二：
根据ABC模型：分析触发事件、信念与结果的关系，分析复盘内容中的隐藏模式。

任务三：
根据阿德勒积极心理学的相关知识生成个性化的行动建议。

注意：
- 识别其中的矛盾项，根据复盘内容判断其倾向，保留更可靠的那一条。
- 输出特质时，如果能够分析完全的5W1H 6个元素，就完全输出，如果只能分析出其中几个元素，也可以组成一句话输出，如果一个元素都没有，直接输出"无"。原则是不要编造。要保持完整的一句话，不要使用（What）的形式对元素进行标注；
- 输出模式时，不要使用A、B、C或事件、信念之类的进行标注；
- 输出建议时使用通俗易懂的语言，要聚焦在立马可执行的最小化行动；
- 最终的输出结果为选取好的无序表格，不要有多余的空格，没有其他信息。
- 注意输出的逻辑，要求语言简洁，易于理解，不超过60个字。输出结果如：
- 个人特质：个人宪法
- 模式识别：隐藏模式
- 行动建议：行动建议

以下是需要分析的内容：
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

/// The full user message for `content`.
pub fn build_prompt(content: &str) -> String {
    format!("{PROMPT}{}", plain_text(content))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct ChatAnalyzer {
    http: reqwest::Client,
    config: AnalysisConfig,
}

impl ChatAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: AnalysisConfig) -> Self {
        Self { http, config }
    }

    async fn complete(&self, content: &str) -> Result<String, AnalysisError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::NotConfigured("DASHSCOPE_API_KEY is not set".into()))?;

        let preview: String = content.chars().take(100).collect();
        tracing::debug!("Analysis requested for: {}...", preview);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(content)),
            }],
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

impl Analyzer for ChatAnalyzer {
    async fn analyze(&self, content: &str) -> Result<String, AnalysisError> {
        let result = self.complete(content).await;
        if let Err(e) = &result {
            tracing::error!("Diary analysis failed: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn analyzer(base_url: String) -> ChatAnalyzer {
        ChatAnalyzer::new(AnalysisConfig {
            api_key: Some("sk-test".to_string()),
            base_url,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    #[test]
    fn test_prompt_flattens_html() {
        let prompt = build_prompt("<p>今天&amp;明天</p>");
        assert!(prompt.starts_with("分析复盘内容"));
        assert!(prompt.ends_with("今天&明天"));
        assert!(!prompt.contains("<p>"));
    }

    #[test]
    fn test_prompt_keeps_markdown() {
        let prompt = build_prompt("# 标题\n- 一");
        assert!(prompt.ends_with("# 标题\n- 一"));
    }

    #[tokio::test]
    async fn test_analyze_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_includes("deepseek-r1")
                    .body_includes("晨跑五公里");
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "- 个人特质：坚持"}}
                    ]
                }));
            })
            .await;

        let analysis = analyzer(server.base_url()).analyze("晨跑五公里").await.unwrap();
        mock.assert_async().await;
        assert_eq!(analysis, "- 个人特质：坚持");
    }

    #[tokio::test]
    async fn test_analyze_maps_http_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429);
            })
            .await;

        let err = analyzer(server.base_url()).analyze("x").await.unwrap_err();
        assert_eq!(err, AnalysisError::Status(429));
    }

    #[tokio::test]
    async fn test_analyze_without_choices_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let err = analyzer(server.base_url()).analyze("x").await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let analyzer = ChatAnalyzer::new(AnalysisConfig::default());
        assert!(matches!(
            analyzer.analyze("x").await,
            Err(AnalysisError::NotConfigured(_))
        ));
    }
}
