use crate::app::command_support::{load_settings, map_config_err};
use crate::config::{default_global_config_path, save_global_settings, Settings};
use crate::llm::OllamaClient;

pub fn cmd_model(args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        None | Some("show") => cmd_model_show(),
        Some("list") => cmd_model_list(),
        Some("set") if args.len() == 2 => cmd_model_set(&args[1]),
        _ => Err("usage: model show | model list | model set <name>".to_string()),
    }
}

fn cmd_model_show() -> Result<String, String> {
    let settings = load_settings()?;
    Ok(format!(
        "model={}\nhost={}",
        settings.model,
        settings.ollama_base_url()
    ))
}

fn cmd_model_list() -> Result<String, String> {
    let settings = load_settings()?;
    let client = OllamaClient::from_settings(&settings);
    let models = client.list_models().map_err(|e| e.to_string())?;
    if models.is_empty() {
        return Ok(format!("no models installed at {}", client.base_url()));
    }
    Ok(models
        .iter()
        .map(|model| {
            let marker = if model.matches(&settings.model) { "*" } else { " " };
            match model.size {
                Some(bytes) => format!("{marker} {}  {}", model.name, format_model_size(bytes)),
                None => format!("{marker} {}", model.name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Persists the model in the settings file; env overrides are not written back.
fn cmd_model_set(model: &str) -> Result<String, String> {
    let model = model.trim();
    if model.is_empty() {
        return Err("model name must be non-empty".to_string());
    }
    let path = default_global_config_path().map_err(map_config_err)?;
    let mut settings = Settings::from_path(&path).map_err(map_config_err)?;
    settings.model = model.to_string();
    let saved = save_global_settings(&settings).map_err(map_config_err)?;
    Ok(format!("model={model}\nsettings={}", saved.display()))
}

/// Decimal units, matching `ollama list`.
fn format_model_size(bytes: u64) -> String {
    const GB: f64 = 1_000_000_000.0;
    const MB: f64 = 1_000_000.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}
