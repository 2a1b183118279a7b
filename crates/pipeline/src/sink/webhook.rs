//! 웹훅(메신저 봇 API) 싱크
//!
//! `POST {base_url}/bot{token}/sendMessage`로 JSON 본문을 보냅니다.
//!
//! ```json
//! {"chat_id": "...", "text": "...", "parse_mode": "HTML", "disable_web_page_preview": true}
//! ```
//!
//! 2xx가 아닌 상태 코드이거나 응답 본문의 `ok`가 `false`이면 실패로 처리합니다.
//! 봇 토큰은 URL에만 들어가며 로그나 `Debug` 출력에 노출하지 않습니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tailwatch_core::config::WebhookConfig;
use tailwatch_core::error::SinkError;
use tailwatch_core::pipeline::{Markup, Sink};

use crate::error::LogPipelineError;

/// HTTP 클라이언트 요청 타임아웃
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// 에러 메시지에 포함할 응답 본문 최대 길이
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: String,
}

/// 웹훅 싱크
pub struct WebhookSink {
    client: reqwest::Client,
    /// 토큰이 포함된 전송 URL
    endpoint: reqwest::Url,
    chat_id: String,
}

impl WebhookSink {
    /// `[webhook]` 설정으로 싱크를 만듭니다.
    ///
    /// # Errors
    ///
    /// 토큰/채팅 ID가 비어 있거나 `base_url`이 올바른 URL이 아니면
    /// [`LogPipelineError::SinkBuild`]를 반환합니다.
    pub fn new(config: &WebhookConfig) -> Result<Self, LogPipelineError> {
        let token = config.bot_token.trim();
        let chat_id = config.chat_id.trim();
        if token.is_empty() || chat_id.is_empty() {
            return Err(build_err("bot_token and chat_id must not be empty"));
        }

        let base = config.base_url.trim().trim_end_matches('/');
        let endpoint = reqwest::Url::parse(&format!("{base}/bot{token}/sendMessage"))
            .map_err(|e| build_err(&format!("invalid base_url '{base}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(build_err(&format!(
                "unsupported scheme '{}' in base_url",
                endpoint.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tailwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| build_err(&format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            chat_id: chat_id.to_owned(),
        })
    }
}

fn build_err(reason: &str) -> LogPipelineError {
    LogPipelineError::SinkBuild {
        sink: "webhook".to_owned(),
        reason: reason.to_owned(),
    }
}

impl std::fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSink")
            .field("host", &self.endpoint.host_str())
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn markup(&self) -> Markup {
        Markup::Html
    }

    async fn send(&self, text: &str) -> Result<(), SinkError> {
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            // reqwest 에러 메시지에는 토큰이 든 URL이 포함되므로 제거
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        let decoded: SendMessageResponse = match serde_json::from_str(&raw) {
            Ok(decoded) => decoded,
            Err(_) if !status.is_success() => {
                return Err(SinkError::Api {
                    status: status.as_u16(),
                    ok: false,
                    description: truncate(&raw, MAX_ERROR_BODY),
                });
            }
            Err(e) => {
                return Err(SinkError::Decode {
                    status: status.as_u16(),
                    reason: e.to_string(),
                });
            }
        };

        if !status.is_success() || !decoded.ok {
            return Err(SinkError::Api {
                status: status.as_u16(),
                ok: decoded.ok,
                description: decoded.description,
            });
        }

        tracing::trace!(status = status.as_u16(), "webhook message accepted");
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_owned();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
