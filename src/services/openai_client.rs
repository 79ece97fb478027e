use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use crate::resilience::{retry_with_backoff, RetryPolicy};
use crate::services::collaborators::TextCompletion;

pub struct OpenaiClient {
    client: Client<OpenAIConfig>,
    retry: RetryPolicy,
}

impl OpenaiClient {
    pub fn new(api_key: String, retry: RetryPolicy) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        OpenaiClient {
            client: Client::with_config(config),
            retry,
        }
    }
}

#[async_trait]
impl TextCompletion for OpenaiClient {
    async fn complete(
        &self,
        role: &str,
        task: &str,
        context: Option<&str>,
    ) -> anyhow::Result<String> {
        let prompt = match context {
            Some(prior) => format!("{task}\n\nOutput of the previous step:\n{prior}"),
            None => task.to_string(),
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model("gpt-4o-mini")
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(role)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .max_tokens(1000_u32)
            .build()?;

        let client = &self.client;
        let content = retry_with_backoff(self.retry, "openai completion", || {
            let request = request.clone();
            async move {
                let response = client.chat().create(request).await?;
                let first_choice = response
                    .choices
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))?;
                first_choice
                    .message
                    .content
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("No content in OpenAI response"))
            }
        })
        .await?;

        log::debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}
