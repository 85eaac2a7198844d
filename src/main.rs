use anyhow::Result;
use carousel_studio::core::config::Config;
use carousel_studio::core::io::NativeStorage;
use carousel_studio::services::llm::create_llm;
use carousel_studio::services::workflow::Studio;
use carousel_studio::ui;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let llm = create_llm(&config.llm)?;
    let storage = Arc::new(NativeStorage::new());

    let mut studio = Studio::new(config, llm, storage).await;
    ui::run(&mut studio).await?;

    Ok(())
}
