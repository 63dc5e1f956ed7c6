#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Chat,
    Send,
    Sessions,
    Model,
    Doctor,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "chat" => CliVerb::Chat,
        "send" => CliVerb::Send,
        "sessions" => CliVerb::Sessions,
        "model" => CliVerb::Model,
        "doctor" => CliVerb::Doctor,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  chat                                 Open the interactive chat UI".to_string(),
        "  send [--chat <id>] [--image <path>] <message>".to_string(),
        "                                       Send one message and print the reply"
            .to_string(),
        "  sessions list                        List saved chats, most recent first".to_string(),
        "  sessions show <id>                   Print a saved chat transcript".to_string(),
        "  sessions delete <id>                 Delete a saved chat".to_string(),
        "  model show|list|set <name>           Show, list or change the chat model".to_string(),
        "  doctor                               Check settings, storage and the model service"
            .to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = vec![
        "Wandee".to_string(),
        "Chat with a local Ollama model; conversations are saved as JSON files.".to_string(),
        String::new(),
    ];
    lines.extend(cli_help_lines());
    lines.join("\n")
}
