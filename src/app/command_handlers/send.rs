use crate::app::command_support::{chat_services, parse_chat_id};
use crate::chat::{format_response_time, stage_image, Conversation, Topic};
use std::path::PathBuf;

const USAGE: &str = "usage: send [--chat <id>] [--image <path>] <message>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendArgs {
    pub chat_id: Option<String>,
    pub image: Option<PathBuf>,
    pub message: String,
}

pub fn parse_send_args(args: &[String]) -> Result<SendArgs, String> {
    let mut chat_id = None;
    let mut image = None;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--chat" => {
                chat_id = Some(iter.next().ok_or(USAGE)?.clone());
            }
            "--image" => {
                image = Some(PathBuf::from(iter.next().ok_or(USAGE)?));
            }
            "--" => {
                words.extend(iter.by_ref().cloned());
            }
            _ => words.push(arg.clone()),
        }
    }
    let message = words.join(" ");
    if message.trim().is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(SendArgs {
        chat_id,
        image,
        message,
    })
}

pub fn cmd_send(args: &[String]) -> Result<String, String> {
    let parsed = parse_send_args(args)?;
    let services = chat_services()?;

    let mut conversation = match parsed.chat_id.as_deref() {
        Some(raw) => {
            let chat_id = parse_chat_id(raw)?;
            if !services.store.contains(&chat_id) {
                return Err(format!("unknown chat `{chat_id}`"));
            }
            Conversation::open(&services.store, chat_id).map_err(|e| e.to_string())?
        }
        None => Conversation::new(),
    };
    if let Some(path) = parsed.image.as_deref() {
        conversation.stage_image(stage_image(path).map_err(|e| e.to_string())?);
    }

    let outcome = conversation
        .submit(services.context(), &parsed.message)
        .map_err(|e| e.to_string())?;

    let mut lines = vec![
        outcome.reply.clone(),
        String::new(),
        format!("chat_id={}", outcome.chat_id),
        format!(
            "response_time={}",
            format_response_time(outcome.response_time)
        ),
    ];
    match &outcome.created_from {
        Some(Topic::Generated(_)) => lines.push("topic=generated".to_string()),
        Some(Topic::Fallback { reason, .. }) => {
            lines.push("topic=fallback".to_string());
            lines.push(format!("topic_error={reason}"));
        }
        None => {}
    }
    if outcome.image_sent {
        lines.push("image_sent=true".to_string());
    }
    Ok(lines.join("\n"))
}
