use serde::Serialize;
use serde_json::Value;
use switchyard_model::{ModelMessage, ModelRequest, ModelSettings};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct TextBlock {
    text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Message {
    role: Role,
    content: Vec<TextBlock>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

/// The body of a Converse (or ConverseStream) call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<TextBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inference_config: Option<InferenceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_model_request_fields: Option<Value>,
}

pub fn create_request(
    req: &ModelRequest,
    settings: &ModelSettings,
) -> ConverseRequest {
    let mut messages = vec![];
    let mut system = vec![];
    for msg in &req.messages {
        match msg {
            ModelMessage::System(text) => system.push(TextBlock {
                text: text.clone(),
            }),
            ModelMessage::User(text) => messages.push(Message {
                role: Role::User,
                content: vec![TextBlock { text: text.clone() }],
            }),
            ModelMessage::Assistant(text) => messages.push(Message {
                role: Role::Assistant,
                content: vec![TextBlock { text: text.clone() }],
            }),
        }
    }

    let inference_config = InferenceConfig {
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        top_p: settings.top_p,
        stop_sequences: settings.stop.clone(),
    };
    ConverseRequest {
        messages,
        system,
        inference_config: (inference_config != InferenceConfig::default())
            .then_some(inference_config),
        additional_model_request_fields: settings.reasoning.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("Be brief.".to_owned()),
                ModelMessage::User("Hello".to_owned()),
                ModelMessage::Assistant("Hi".to_owned()),
            ],
        };
        let settings = ModelSettings {
            model_name: "anthropic.claude-3-haiku-20240307-v1:0".to_owned(),
            max_tokens: Some(256),
            stop: Some(vec!["\n\nHuman:".to_owned()]),
            ..Default::default()
        };
        let body = serde_json::to_value(create_request(&request, &settings))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "messages": [
                    { "role": "user", "content": [{ "text": "Hello" }] },
                    { "role": "assistant", "content": [{ "text": "Hi" }] },
                ],
                "system": [{ "text": "Be brief." }],
                "inferenceConfig": {
                    "maxTokens": 256,
                    "stopSequences": ["\n\nHuman:"],
                },
            })
        );
    }

    #[test]
    fn test_empty_inference_config() {
        let request = ModelRequest {
            messages: vec![ModelMessage::User("Hello".to_owned())],
        };
        let body = serde_json::to_value(create_request(
            &request,
            &ModelSettings::default(),
        ))
        .unwrap();
        assert!(body.get("inferenceConfig").is_none());
        assert!(body.get("system").is_none());
    }
}
