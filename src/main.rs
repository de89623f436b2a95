use std::sync::Arc;

use voice_intake::catalog::CATALOG;
use voice_intake::config::IntakeConfig;
use voice_intake::extractor::FieldExtractor;
use voice_intake::interview::InterviewSession;
use voice_intake::llm::{LlmBackend, LlmConfig, create_provider};
use voice_intake::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = IntakeConfig::from_env()?;

    // Pick an LLM backend from whichever API key is present. Without one the
    // server still runs; extraction degrades to "no update" on every turn.
    let llm = if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
        let llm_config = LlmConfig {
            backend: LlmBackend::Anthropic,
            api_key: secrecy::SecretString::from(api_key),
            model: config.model.clone(),
        };
        Some(create_provider(&llm_config)?)
    } else if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
        let llm_config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from(api_key),
            model: config.model.clone(),
        };
        Some(create_provider(&llm_config)?)
    } else {
        tracing::warn!(
            "no ANTHROPIC_API_KEY or OPENAI_API_KEY set; extraction is disabled \
             and the interview will not advance"
        );
        None
    };

    eprintln!("🎙 Voice Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Questions: {}", CATALOG.len());
    eprintln!("   Voice WS: ws://0.0.0.0:{}/ws/voice", config.port);
    eprintln!("   Extract API: http://0.0.0.0:{}/api/extract\n", config.port);

    let extractor = Arc::new(FieldExtractor::new(llm.clone(), &config));
    let session = Arc::new(InterviewSession::new(
        CATALOG,
        FieldExtractor::new(llm, &config),
    ));

    let app = server::app(session, extractor);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "voice intake server started");
    axum::serve(listener, app).await?;

    Ok(())
}
