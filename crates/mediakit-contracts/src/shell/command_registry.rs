#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose whole remainder is one free-text value.
pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "tab",
        action: "switch_tab",
    },
    CommandSpec {
        command: "prompt",
        action: "set_prompt",
    },
    CommandSpec {
        command: "factor",
        action: "select_factor",
    },
    CommandSpec {
        command: "suggest",
        action: "apply_suggestion",
    },
    CommandSpec {
        command: "base",
        action: "set_base_prompt",
    },
    CommandSpec {
        command: "negative",
        action: "set_negative_prompt",
    },
    CommandSpec {
        command: "model",
        action: "select_model",
    },
    CommandSpec {
        command: "style",
        action: "toggle_style",
    },
    CommandSpec {
        command: "scene",
        action: "set_scene",
    },
    CommandSpec {
        command: "motion",
        action: "select_motion",
    },
    CommandSpec {
        command: "copy",
        action: "copy",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "load",
        action: "load_image",
    },
    CommandSpec {
        command: "download",
        action: "download",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "paste",
        action: "paste_image",
    },
    CommandSpec {
        command: "clear",
        action: "clear_image",
    },
    CommandSpec {
        command: "clear_all",
        action: "clear_all",
    },
    CommandSpec {
        command: "clear_styles",
        action: "clear_styles",
    },
    CommandSpec {
        command: "enhance",
        action: "enhance",
    },
    CommandSpec {
        command: "describe",
        action: "describe",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "presets",
        action: "presets",
    },
    CommandSpec {
        command: "tips",
        action: "tips",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const SHELL_HELP_COMMANDS: &[&str] = &[
    "/tab",
    "/load",
    "/paste",
    "/clear",
    "/clear_all",
    "/prompt",
    "/factor",
    "/suggest",
    "/enhance",
    "/download",
    "/describe",
    "/base",
    "/negative",
    "/model",
    "/style",
    "/clear_styles",
    "/scene",
    "/motion",
    "/copy",
    "/status",
    "/presets",
    "/tips",
    "/help",
    "/quit",
];
