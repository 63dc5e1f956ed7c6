use crate::app::command_support::{ensure_state_root, load_settings, map_config_err};
use crate::config::default_global_config_path;
use crate::llm::OllamaClient;
use crate::shared::fs_atomic::atomic_write_file;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct DoctorFinding {
    id: String,
    ok: bool,
    detail: String,
    remediation: String,
}

fn doctor_finding(
    id: impl Into<String>,
    ok: bool,
    detail: impl Into<String>,
    remediation: impl Into<String>,
) -> DoctorFinding {
    DoctorFinding {
        id: id.into(),
        ok,
        detail: detail.into(),
        remediation: remediation.into(),
    }
}

fn can_write_directory(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
    let probe = dir.join(".doctor-probe");
    atomic_write_file(&probe, b"ok")
        .map_err(|e| format!("failed to write {}: {e}", probe.display()))?;
    fs::remove_file(&probe).map_err(|e| format!("failed to remove {}: {e}", probe.display()))
}

pub fn cmd_doctor() -> Result<String, String> {
    let mut findings = Vec::new();
    let config_path = default_global_config_path().map_err(map_config_err)?;
    let state_root = ensure_state_root()?;

    let settings = match load_settings() {
        Ok(settings) => {
            findings.push(doctor_finding(
                "config.parse",
                true,
                if config_path.exists() {
                    format!("config={}", config_path.display())
                } else {
                    "config file absent; using defaults".to_string()
                },
                "none",
            ));
            Some(settings)
        }
        Err(err) => {
            findings.push(doctor_finding(
                "config.parse",
                false,
                format!("settings load failed: {err}"),
                "fix ~/.wandee/config.yaml and retry `wandee doctor`",
            ));
            None
        }
    };

    if let Some(settings) = settings.as_ref() {
        let sessions_dir = settings.resolve_sessions_dir(&state_root);
        findings.push(match can_write_directory(&sessions_dir) {
            Ok(()) => doctor_finding(
                "storage.sessions",
                true,
                format!("writable={}", sessions_dir.display()),
                "none",
            ),
            Err(err) => doctor_finding(
                "storage.sessions",
                false,
                err,
                "grant write permission or change `sessions_dir` in ~/.wandee/config.yaml",
            ),
        });

        let client = OllamaClient::from_settings(settings);
        match client.list_models() {
            Ok(models) => {
                findings.push(doctor_finding(
                    "service.reachable",
                    true,
                    format!("host={} models={}", client.base_url(), models.len()),
                    "none",
                ));
                findings.push(doctor_finding(
                    "service.model",
                    models.iter().any(|model| model.matches(&settings.model)),
                    format!("model={}", settings.model),
                    format!(
                        "run `ollama pull {}` or pick an installed model with `wandee model set`",
                        settings.model
                    ),
                ));
            }
            Err(err) => findings.push(doctor_finding(
                "service.reachable",
                false,
                err.to_string(),
                "start Ollama (`ollama serve`) or set OLLAMA_HOST / ollama_host",
            )),
        }
    }

    let failed = findings.iter().filter(|f| !f.ok).count();
    let summary = if failed == 0 { "healthy" } else { "unhealthy" };
    let mut lines = vec![
        format!("summary={summary}"),
        format!("checks_total={}", findings.len()),
        format!("checks_failed={failed}"),
    ];
    for finding in findings {
        lines.push(format!(
            "check:{}={}",
            finding.id,
            if finding.ok { "ok" } else { "fail" }
        ));
        lines.push(format!("check:{}.detail={}", finding.id, finding.detail));
        if !finding.ok {
            lines.push(format!(
                "check:{}.remediation={}",
                finding.id, finding.remediation
            ));
        }
    }
    Ok(lines.join("\n"))
}
