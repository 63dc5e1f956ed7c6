use crate::app::command_support::{chat_services, parse_chat_id};
use crate::chat::decode_image;
use crate::history::{format_chat_title, Message, SessionSummary};
use chrono::{DateTime, Local};

pub fn cmd_sessions(args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        None | Some("list") => cmd_sessions_list(),
        Some("show") if args.len() == 2 => cmd_sessions_show(&args[1]),
        Some("delete") if args.len() == 2 => cmd_sessions_delete(&args[1]),
        _ => Err("usage: sessions list | sessions show <id> | sessions delete <id>".to_string()),
    }
}

fn cmd_sessions_list() -> Result<String, String> {
    let services = chat_services()?;
    let sessions = services.store.list().map_err(|e| e.to_string())?;
    if sessions.is_empty() {
        return Ok("No chat history found.".to_string());
    }
    Ok(sessions
        .iter()
        .map(render_summary)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn render_summary(session: &SessionSummary) -> String {
    let modified: DateTime<Local> = session.modified.into();
    format!(
        "{}\t{}\t{}",
        session.chat_id,
        modified.format("%Y-%m-%d %H:%M"),
        session.title
    )
}

fn cmd_sessions_show(raw: &str) -> Result<String, String> {
    let chat_id = parse_chat_id(raw)?;
    let services = chat_services()?;
    if !services.store.contains(&chat_id) {
        return Err(format!("unknown chat `{chat_id}`"));
    }
    let messages = services.store.load(&chat_id).map_err(|e| e.to_string())?;
    let mut lines = vec![format!("Topic: {}", format_chat_title(chat_id.as_str()))];
    lines.extend(messages.iter().map(render_message));
    Ok(lines.join("\n"))
}

pub fn render_message(message: &Message) -> String {
    let mut rendered = format!("{}> {}", message.role, message.content);
    if let Some(image) = message.first_image() {
        match decode_image(image) {
            Ok(bytes) => rendered.push_str(&format!("\n  [attached image, {} bytes]", bytes.len())),
            Err(_) => rendered.push_str("\n  [attached image, undecodable]"),
        }
    }
    rendered
}

fn cmd_sessions_delete(raw: &str) -> Result<String, String> {
    let chat_id = parse_chat_id(raw)?;
    let services = chat_services()?;
    if !services.store.delete(&chat_id).map_err(|e| e.to_string())? {
        return Err(format!("unknown chat `{chat_id}`"));
    }
    services
        .log
        .info("session.deleted", &format!("chat_id={chat_id}"));
    Ok(format!("deleted chat_id={chat_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_message_notes_attached_image_size() {
        let message = Message::user("look").with_image("bWVvdw==");
        assert_eq!(
            render_message(&message),
            "user> look\n  [attached image, 4 bytes]"
        );
        assert_eq!(
            render_message(&Message::assistant("a cat")),
            "assistant> a cat"
        );
    }
}
