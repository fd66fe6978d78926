use anyhow::Result;

use crate::config::LookbookConfig;
use crate::translate::Translator;

pub async fn translate(config: &LookbookConfig, text: &str, lang: &str) -> Result<()> {
    let translator = Translator::new(&config.completion)?;
    match translator.translate(text, lang).await {
        Ok(translated) => {
            println!("{}", translated.trim());
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "error translating text");
            Err(e)
        }
    }
}
