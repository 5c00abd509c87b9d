use serde_json::json;
use switchyard::model::{
    ChatModel, Env, ErrorKind, LlmConfig, ModelMessage, ModelRequest,
};
use switchyard::providers::bedrock::BedrockChatModel;
use switchyard::providers::ollama::OllamaChatModel;
use switchyard::providers::openai::{OpenAIChatModel, OpenAIProvider};
use switchyard::{LlmFactory, default_factory_builder};
use switchyard_test_model::TestModelProvider;
use tracing_subscriber::EnvFilter;

fn factory(env: Env) -> LlmFactory {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
    default_factory_builder().with_env(env).build()
}

fn request() -> ModelRequest {
    ModelRequest {
        messages: vec![
            ModelMessage::System("Be brief.".to_owned()),
            ModelMessage::User("Hi".to_owned()),
        ],
    }
}

#[test]
fn test_builtin_classes() {
    assert_eq!(
        factory(Env::empty()).registered_classes(),
        ["azure-openai", "bedrock", "ollama", "openai"]
    );
}

#[tokio::test]
async fn test_openai_from_env() {
    let factory = factory(Env::from_pairs([
        ("OPENAI_API_KEY", "sk-from-env"),
        ("OPENAI_API_BASE", "https://proxy.example.com/v1"),
    ]));
    let resources = factory
        .create_resources_from_value(json!({
            "class": "OpenAI",
            "model_name": "gpt-4o-mini",
            "temperature": 0.5,
            "max_tokens": 128,
            "streaming": false,
        }))
        .await
        .unwrap();

    let model = resources
        .model()
        .downcast_ref::<OpenAIChatModel>()
        .unwrap();
    assert_eq!(model.settings().temperature, Some(0.5));
    assert_eq!(model.settings().max_tokens, Some(128));
    assert!(model.settings().streaming);
    assert!(model.settings().stream_usage);

    let built = model.request(&request()).unwrap().build().unwrap();
    assert_eq!(
        built.url().as_str(),
        "https://proxy.example.com/v1/chat/completions"
    );
    assert_eq!(built.headers().get("accept").unwrap(), "text/event-stream");
    let body = model.request_body(&request());
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert_eq!(body["n"], json!(1));
    assert_eq!(body["stream"], json!(true));

    let model = resources.model().clone();
    resources.delete_resources().await;
    let model = model.downcast_ref::<OpenAIChatModel>().unwrap();
    let err = model.request(&request()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
}

#[tokio::test]
async fn test_openai_without_credentials() {
    let err = factory(Env::empty())
        .create_resources_from_value(json!({
            "class": "openai",
            "model_name": "gpt-4o",
        }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderAuth);
}

#[tokio::test]
async fn test_azure_deployment_url() {
    let factory = factory(Env::from_pairs([
        ("AZURE_OPENAI_ENDPOINT", "https://my-resource.openai.azure.com"),
        ("AZURE_OPENAI_API_KEY", "azure-key"),
    ]));
    let resources = factory
        .create_resources_from_value(json!({
            "class": "azure-openai",
            "model_name": "gpt-4o",
            "deployment_name": "prod-4o",
        }))
        .await
        .unwrap();

    let model = resources
        .model()
        .downcast_ref::<OpenAIChatModel>()
        .unwrap();
    assert_eq!(model.class(), "azure-openai");
    let built = model.request(&request()).unwrap().build().unwrap();
    assert_eq!(
        built.url().as_str(),
        "https://my-resource.openai.azure.com/openai/deployments/prod-4o/\
         chat/completions?api-version=2024-10-21"
    );
    resources.delete_resources().await;
}

#[tokio::test]
async fn test_bedrock_region_from_env() {
    let factory = factory(Env::from_pairs([
        ("AWS_DEFAULT_REGION", "eu-west-1"),
        ("AWS_BEARER_TOKEN_BEDROCK", "token"),
    ]));
    let resources = factory
        .create_resources_from_value(json!({
            "class": "bedrock",
            "model_name": "amazon.nova-pro-v1:0",
            "max_tokens": 512,
        }))
        .await
        .unwrap();

    let model = resources
        .model()
        .downcast_ref::<BedrockChatModel>()
        .unwrap();
    let built = model.request(&request()).unwrap().build().unwrap();
    assert_eq!(
        built.url().as_str(),
        "https://bedrock-runtime.eu-west-1.amazonaws.com/model/\
         amazon.nova-pro-v1:0/converse-stream"
    );

    let config = LlmConfig::default().with_model_name("amazon.nova-pro-v1:0");
    assert_eq!(factory.max_prompt_tokens(&config).unwrap(), 150_000);
    resources.delete_resources().await;
}

#[tokio::test]
async fn test_ollama_needs_no_resource() {
    let factory =
        factory(Env::from_pairs([("OLLAMA_HOST", "gpu-box:11434")]));
    let resources = factory
        .create_resources_from_value(json!({
            "class": "ollama",
            "model_name": "llama3.1",
        }))
        .await
        .unwrap();

    assert!(resources.policy().is_none());
    let model = resources
        .model()
        .downcast_ref::<OllamaChatModel>()
        .unwrap();
    assert_eq!(model.chat_url().as_str(), "http://gpu-box:11434/api/chat");
    resources.delete_resources().await;
}

#[tokio::test]
async fn test_extension_classes() {
    let fake = TestModelProvider::default();
    let stats = fake.stats();
    let factory = default_factory_builder()
        .with_env(Env::from_pairs([("OPENAI_API_KEY", "sk-test")]))
        .register_policy("test-openai", OpenAIProvider)
        .register_policy("ollama", fake)
        .build();

    let resources = factory
        .create_resources_from_value(json!({
            "class": "test-openai",
            "model_name": "gpt-4o",
        }))
        .await
        .unwrap();
    assert!(resources.model().downcast_ref::<OpenAIChatModel>().is_some());
    assert_eq!(resources.model().class(), "test-openai");
    resources.delete_resources().await;

    let resources = factory
        .create_resources_from_value(json!({
            "class": "ollama",
            "model_name": "llama3.1",
        }))
        .await
        .unwrap();
    assert_eq!(resources.model().class(), "ollama");
    resources.delete_resources().await;
    assert_eq!(stats.policies(), 1);
    assert_eq!(stats.outstanding(), 0);
}
