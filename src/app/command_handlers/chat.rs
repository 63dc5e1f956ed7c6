use crate::app::command_support::chat_services;
use crate::tui::chat::run_chat_tui;

pub fn cmd_chat(args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: chat".to_string());
    }

    let services = chat_services()?;
    let chat_id = run_chat_tui(services)?;
    Ok(match chat_id {
        Some(chat_id) => format!("chat ended\nchat_id={chat_id}"),
        None => "chat ended".to_string(),
    })
}
