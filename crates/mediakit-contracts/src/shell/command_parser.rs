use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{CommandSpec, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_PATH_COMMANDS};

/// One line of shell input resolved to an action name and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellCommand {
    pub action: String,
    pub raw: String,
    pub text: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl ShellCommand {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            text: None,
            command_args: BTreeMap::new(),
        }
    }

    pub fn arg_str(&self, key: &str) -> &str {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    parse_path_args(arg).join(" ")
}

pub fn parse_command(text: &str) -> ShellCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ShellCommand::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut parsed = ShellCommand::new(action, text);
                parsed
                    .command_args
                    .insert("value".to_string(), Value::String(arg.to_string()));
                return parsed;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let mut parsed = ShellCommand::new(action, text);
                parsed.command_args.insert(
                    "path".to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return parsed;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return ShellCommand::new(action, text);
            }

            let mut parsed = ShellCommand::new("unknown", text);
            parsed
                .command_args
                .insert("command".to_string(), Value::String(command));
            parsed
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return parsed;
        }
    }

    // Bare text feeds the mounted panel's free-text field.
    let mut parsed = ShellCommand::new("set_text", text);
    parsed.text = Some(raw_trimmed.to_string());
    parsed
}
