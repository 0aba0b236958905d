//! Vendor request/response envelopes.
//!
//! | Provider  | Endpoint                                   | Text path                              |
//! |-----------|--------------------------------------------|----------------------------------------|
//! | Anthropic | `/v1/messages`                             | `content[0].text`                      |
//! | OpenAI    | `/v1/chat/completions`                     | `choices[0].message.content`           |
//! | Gemini    | `/v1beta/models/{model}:generateContent`   | `candidates[0].content.parts[0].text`  |

use serde_json::{json, Value};

use crate::agent::{Agent, Provider};

/// Path (relative to the provider base URL) for a completion call.
pub fn endpoint_path(agent: &Agent) -> String {
    match agent.provider {
        Provider::Anthropic => "/v1/messages".to_string(),
        Provider::OpenAi => "/v1/chat/completions".to_string(),
        Provider::Gemini => format!("/v1beta/models/{}:generateContent", agent.model),
    }
}

/// JSON body for a single-turn completion of `prompt`.
pub fn build_request(agent: &Agent, prompt: &str) -> Value {
    match agent.provider {
        Provider::Anthropic => json!({
            "model": agent.model,
            "max_tokens": agent.max_tokens,
            "temperature": agent.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        }),
        Provider::OpenAi => json!({
            "model": agent.model,
            "max_tokens": agent.max_tokens,
            "temperature": agent.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        }),
        Provider::Gemini => json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": agent.temperature,
                "maxOutputTokens": agent.max_tokens,
            },
        }),
    }
}

/// Generated text, or `None` when the response does not have the expected shape.
pub fn extract_text(provider: Provider, body: &Value) -> Option<String> {
    let text = match provider {
        Provider::Anthropic => &body["content"][0]["text"],
        Provider::OpenAi => &body["choices"][0]["message"]["content"],
        Provider::Gemini => &body["candidates"][0]["content"]["parts"][0]["text"],
    };
    text.as_str().map(str::to_string)
}
