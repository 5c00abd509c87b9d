use serde::Serialize;
use serde_json::Value;
use switchyard_model::{ModelMessage, ModelRequest, ModelSettings};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

impl Options {
    pub fn from_settings(
        settings: &ModelSettings,
        num_ctx: Option<u32>,
    ) -> Self {
        Self {
            temperature: settings.temperature,
            top_p: settings.top_p,
            presence_penalty: settings.presence_penalty,
            frequency_penalty: settings.frequency_penalty,
            seed: settings.seed,
            stop: settings.stop.clone(),
            num_predict: settings.max_tokens,
            num_ctx,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<Value>,
}

pub fn create_request(
    req: &ModelRequest,
    settings: &ModelSettings,
    options: &Options,
    keep_alive: Option<&str>,
) -> ChatRequest {
    ChatRequest {
        model: settings.model_name.clone(),
        messages: req
            .messages
            .iter()
            .map(|msg| match msg {
                ModelMessage::System(content) => Message::System {
                    content: content.clone(),
                },
                ModelMessage::User(content) => Message::User {
                    content: content.clone(),
                },
                ModelMessage::Assistant(content) => Message::Assistant {
                    content: content.clone(),
                },
            })
            .collect(),
        stream: settings.streaming,
        options: (options != &Options::default()).then(|| options.clone()),
        keep_alive: keep_alive.map(ToOwned::to_owned),
        think: settings.reasoning.clone(),
    }
}
