use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod chat;
pub mod doctor;
pub mod model;
pub mod send;
pub mod sessions;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Chat => chat::cmd_chat(&args[1..]),
        CliVerb::Send => send::cmd_send(&args[1..]),
        CliVerb::Sessions => sessions::cmd_sessions(&args[1..]),
        CliVerb::Model => model::cmd_model(&args[1..]),
        CliVerb::Doctor => doctor::cmd_doctor(),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
