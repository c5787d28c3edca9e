//! Slack API Client
//!
//! HTTP client for the Slack Web API methods the inbox uses.

use http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, trace, warn};

use crate::types::{
    SlackApiResponse, SlackConversationMembersResponse, SlackPermalinkResponse,
    SlackPostEphemeralRequest, SlackPostEphemeralResponse, SlackPostMessageRequest,
    SlackPostMessageResponse, SlackResponseMetadata, SlackUpdateMessageRequest,
};

const SLACK_API_BASE: &str = "https://slack.com/api";
const MEMBERS_PAGE_SIZE: &str = "200";

/// HTTP client for Slack API
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    bot_token: String,
    base_url: String,
}

impl SlackClient {
    /// Create a new Slack client with the given bot token
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(bot_token, SLACK_API_BASE.to_string())
    }

    /// Client that sends requests to `base_url` instead of slack.com
    pub fn with_base_url(bot_token: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post_json<B, T>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<SlackApiResponse<T>, SlackClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .header("Content-Type", "application/json; charset=utf-8")
            .json(body)
            .send()
            .await
            .map_err(SlackClientError::Request)?;

        read_response(method, response).await
    }

    async fn get_query<T>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<SlackApiResponse<T>, SlackClientError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.method_url(method))
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .query(query)
            .send()
            .await
            .map_err(SlackClientError::Request)?;

        read_response(method, response).await
    }

    /// Post a message with blocks to a Slack channel or user
    pub async fn post_message_with_blocks(
        &self,
        channel: &str,
        text: Option<&str>,
        blocks: Vec<Value>,
    ) -> Result<SlackPostMessageResponse, SlackClientError> {
        let request = SlackPostMessageRequest {
            channel: channel.to_string(),
            text: text.map(String::from),
            blocks: Some(blocks),
            thread_ts: None,
            unfurl_links: Some(false),
        };

        self.post_message_raw(request).await
    }

    /// Post a raw message request to Slack
    pub async fn post_message_raw(
        &self,
        request: SlackPostMessageRequest,
    ) -> Result<SlackPostMessageResponse, SlackClientError> {
        trace!(channel = %request.channel, "Posting message to Slack");
        let result: SlackApiResponse<SlackPostMessageResponse> = self.post_json("chat.postMessage", &request).await?;
        trace!(ts = ?result.data.ts, "Message posted successfully");
        Ok(result.data)
    }

    /// Update a message with blocks
    pub async fn update_message_with_blocks(
        &self,
        channel: &str,
        ts: &str,
        text: Option<&str>,
        blocks: Vec<Value>,
    ) -> Result<SlackPostMessageResponse, SlackClientError> {
        let request = SlackUpdateMessageRequest {
            channel: channel.to_string(),
            ts: ts.to_string(),
            text: text.map(String::from),
            blocks: Some(blocks),
        };

        trace!(channel = %request.channel, ts = %request.ts, "Updating message in Slack");
        let result = self.post_json("chat.update", &request).await?;
        Ok(result.data)
    }

    /// Post a message visible only to `user` in `channel`
    pub async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
    ) -> Result<SlackPostEphemeralResponse, SlackClientError> {
        let request = SlackPostEphemeralRequest {
            channel: channel.to_string(),
            user: user.to_string(),
            text: text.to_string(),
            blocks: None,
        };

        trace!(channel = %channel, user = %user, "Posting ephemeral message");
        let result = self.post_json("chat.postEphemeral", &request).await?;
        Ok(result.data)
    }

    pub async fn get_permalink(
        &self,
        channel: &str,
        message_ts: &str,
    ) -> Result<String, SlackClientError> {
        let result: SlackApiResponse<SlackPermalinkResponse> = self
            .get_query(
                "chat.getPermalink",
                &[("channel", channel), ("message_ts", message_ts)],
            )
            .await?;

        result.data.permalink.ok_or_else(|| SlackClientError::Api {
            error: "missing_permalink".to_string(),
            response_metadata: None,
        })
    }

    /// One page of channel members and the cursor of the next page
    pub async fn conversation_members(
        &self,
        channel: &str,
        cursor: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>), SlackClientError> {
        let mut query = vec![("channel", channel), ("limit", MEMBERS_PAGE_SIZE)];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let result: SlackApiResponse<SlackConversationMembersResponse> =
            self.get_query("conversations.members", &query).await?;
        let next_cursor = result.response_metadata.and_then(|m| m.next_cursor);

        trace!(channel = %channel, count = result.data.members.len(), "Fetched channel members");
        Ok((result.data.members, next_cursor))
    }
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn read_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<SlackApiResponse<T>, SlackClientError> {
    let status = response.status();
    let retry_after = retry_after_secs(&response);
    let body = response
        .text()
        .await
        .map_err(SlackClientError::Request)?;

    decode_response(method, status, retry_after, &body)
}

/// Turn a raw Slack response into the typed body or a [`SlackClientError`]
pub(crate) fn decode_response<T: DeserializeOwned>(
    method: &str,
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> Result<SlackApiResponse<T>, SlackClientError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(method = %method, retry_after = ?retry_after, "Slack API rate limited");
        return Err(SlackClientError::RateLimited { retry_after });
    }

    let result: SlackApiResponse<T> =
        serde_json::from_str(body).map_err(|e| SlackClientError::Parse {
            body: body.to_string(),
            error: e,
        })?;

    if !result.ok {
        let error = result.error.unwrap_or_else(|| "unknown".to_string());
        if error == "ratelimited" || error == "rate_limited" {
            warn!(method = %method, "Slack API rate limited");
            return Err(SlackClientError::RateLimited { retry_after });
        }

        error!(
            method = %method,
            error = %error,
            status = %status,
            "Slack API error"
        );
        return Err(SlackClientError::Api {
            error,
            response_metadata: result.response_metadata,
        });
    }

    Ok(result)
}

/// Errors that can occur when interacting with Slack API
#[derive(Debug, thiserror::Error)]
pub enum SlackClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse response: {error}, body: {body}")]
    Parse {
        body: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("Slack API rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("Slack API error: {error}")]
    Api {
        error: String,
        response_metadata: Option<SlackResponseMetadata>,
    },
}

impl From<SlackClientError> for shared::error::CommonError {
    fn from(err: SlackClientError) -> Self {
        match err {
            SlackClientError::Request(e) => e.into(),
            other => shared::error::CommonError::InvalidResponse {
                msg: other.to_string(),
                source: Some(other.into()),
            },
        }
    }
}
