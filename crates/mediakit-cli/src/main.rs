use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use clipboard_rs::common::RustImage;
use clipboard_rs::{Clipboard, ClipboardContext, ContentFormat};
use mediakit_contracts::events::{EventPayload, EventWriter};
use mediakit_contracts::media::UploadedImage;
use mediakit_contracts::shell::{parse_command, ShellCommand, SHELL_HELP_COMMANDS};
use mediakit_contracts::templates::{
    TargetModel, ART_STYLES, CAMERA_MOTIONS, SUGGESTIONS, TIPS, UPSCALE_OPTIONS,
};
use mediakit_engine::clipboard::{ClipboardImageSource, ClipboardSink, CopyStatus};
use mediakit_engine::config::load_env_file;
use mediakit_engine::debounce::SUGGESTION_DELAY;
use mediakit_engine::transcoder;
use mediakit_engine::{
    AiGateway, AppConfig, CameraMotionPanel, CopyTarget, ImageEnhancerPanel, ImageSource,
    ImageToTextPanel, MountedPanel, PanelController, PanelEvent, PasteOutcome, Tab, UiStatus,
    Workbench,
};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "mediakit",
    version,
    about = "AI image enhancement, captioning and prompt crafting"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Append structured events to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[arg(long, global = true)]
    image_model: Option<String>,
    #[arg(long, global = true)]
    vision_model: Option<String>,
    #[arg(long, global = true)]
    text_model: Option<String>,
}

impl CommonArgs {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = self.events.clone() {
            config.events_path = Some(path);
        }
        if let Some(model) = self.image_model.clone() {
            config.image_model = Some(model);
        }
        if let Some(model) = self.vision_model.clone() {
            config.vision_model = Some(model);
        }
        if let Some(model) = self.text_model.clone() {
            config.text_model = Some(model);
        }
        config
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive workbench with the three tabs.
    Shell(ShellArgs),
    Enhance(EnhanceArgs),
    Describe(DescribeArgs),
    Prompt(PromptArgs),
    Video(VideoArgs),
    /// List suggestions, upscale options, camera motions, styles and target models.
    Presets,
}

#[derive(Debug, Parser)]
struct ShellArgs {
    #[arg(long)]
    tab: Option<String>,
}

#[derive(Debug, Parser)]
struct EnhanceArgs {
    image: PathBuf,
    #[arg(long, default_value_t = 2.0)]
    factor: f64,
    #[arg(long)]
    suggestion: Option<String>,
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct DescribeArgs {
    image: PathBuf,
}

#[derive(Debug, Parser)]
struct PromptArgs {
    base: String,
    #[arg(long, default_value = "")]
    negative: String,
    #[arg(long, default_value = "flux")]
    model: String,
    #[arg(long = "style")]
    styles: Vec<String>,
}

#[derive(Debug, Parser)]
struct VideoArgs {
    scene: String,
    #[arg(long)]
    motion: String,
    /// Print the plain composite without asking the model.
    #[arg(long)]
    no_enhance: bool,
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const WAIT_MARGIN: Duration = Duration::from_secs(30);

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("mediakit error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    if let Command::Presets = cli.command {
        print_presets();
        return Ok(0);
    }

    load_env_file(cli.common.env_file.as_deref())?;
    let config = cli.common.apply(AppConfig::from_env());
    let events = EventWriter::for_session(config.events_path.clone());
    let mut payload = EventPayload::new();
    payload.insert("command".to_string(), Value::from(command_name(&cli.command)));
    payload.insert("api_base".to_string(), Value::from(config.api_base.clone()));
    events.record("session_started", payload);

    let gateway = AiGateway::from_config(&config, events)?;
    let wait = config.request_timeout + WAIT_MARGIN;
    match cli.command {
        Command::Shell(args) => run_shell(args, gateway, wait),
        Command::Enhance(args) => run_enhance(args, gateway, wait),
        Command::Describe(args) => run_describe(args, gateway, wait),
        Command::Prompt(args) => run_prompt(args, gateway, wait),
        Command::Video(args) => run_video(args, gateway, wait),
        Command::Presets => Ok(0),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Shell(_) => "shell",
        Command::Enhance(_) => "enhance",
        Command::Describe(_) => "describe",
        Command::Prompt(_) => "prompt",
        Command::Video(_) => "video",
        Command::Presets => "presets",
    }
}

fn run_enhance(args: EnhanceArgs, gateway: AiGateway, wait: Duration) -> Result<i32> {
    let mut panel = ImageEnhancerPanel::new(gateway);
    if !panel.accept_image(&ImageSource::File(args.image.clone())) {
        bail!("{}", panel.error().unwrap_or_default());
    }
    let now = Instant::now();
    if !panel.select_upscale_factor(args.factor, now) {
        bail!("unsupported upscale factor {} (use 1 or 2)", args.factor);
    }
    if let Some(name) = args.suggestion.as_deref() {
        if !panel.apply_suggestion(name, now) {
            bail!("unknown suggestion '{name}'");
        }
    }
    panel.pump_at(now + SUGGESTION_DELAY);
    if let Some(prompt) = args.prompt.as_deref() {
        panel.set_prompt(prompt);
    }

    panel.submit();
    panel.wait(wait);
    if let Some(message) = panel.error() {
        bail!("{message}");
    }
    let saved = panel.download(args.out.as_deref())?;
    println!("Saved {}", saved.display());
    Ok(0)
}

fn run_describe(args: DescribeArgs, gateway: AiGateway, wait: Duration) -> Result<i32> {
    let mut panel = ImageToTextPanel::new(gateway);
    if !panel.accept_image(&ImageSource::File(args.image)) {
        bail!("{}", panel.error().unwrap_or_default());
    }
    panel.generate_description();
    panel.wait(wait);
    if let Some(message) = panel.error() {
        bail!("{message}");
    }
    println!("{}", panel.description());
    Ok(0)
}

fn run_prompt(args: PromptArgs, gateway: AiGateway, wait: Duration) -> Result<i32> {
    let mut panel = ImageToTextPanel::new(gateway);
    panel.set_base_prompt(&args.base);
    panel.set_negative_prompt(&args.negative);
    if !panel.select_model_by_name(&args.model) {
        bail!("unknown target model '{}'", args.model);
    }
    for style in &args.styles {
        if panel.toggle_style(style).is_none() {
            bail!("unknown style '{style}'");
        }
    }
    if !panel.enhance_prompt() {
        bail!("a base prompt is required");
    }
    panel.wait(wait);
    if let Some(message) = panel.error() {
        bail!("{message}");
    }
    println!("Positive prompt:\n{}\n", panel.positive_output());
    println!("Negative prompt:\n{}", panel.negative_output());
    Ok(0)
}

fn run_video(args: VideoArgs, gateway: AiGateway, wait: Duration) -> Result<i32> {
    let mut panel = CameraMotionPanel::new(gateway);
    panel.set_scene(&args.scene);
    if !panel.select_motion(&args.motion) {
        bail!("unknown camera motion '{}'", args.motion);
    }
    if !args.no_enhance {
        if !panel.enhance() {
            bail!("a scene description is required");
        }
        panel.wait(wait);
        if let Some(message) = panel.error() {
            bail!("{message}");
        }
    }
    println!("{}", panel.composite());
    Ok(0)
}

enum Flow {
    Continue,
    Quit,
}

fn run_shell(args: ShellArgs, gateway: AiGateway, wait: Duration) -> Result<i32> {
    let mut bench = Workbench::new(gateway);
    if let Some(name) = args.tab.as_deref() {
        let tab = Tab::from_name(name).with_context(|| format!("unknown tab '{name}'"))?;
        bench.switch(tab);
    }
    let clipboard = SystemClipboard;
    let lines = spawn_stdin_reader()?;

    println!("mediakit shell started. Type /help for commands.");
    print_tab(bench.active_tab());
    show_prompt()?;

    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                let command = parse_command(&line);
                if let Flow::Quit = handle_command(&mut bench, &command, &clipboard)? {
                    break;
                }
                let events = bench.pump_at(Instant::now());
                report(&bench, events);
                show_prompt()?;
                continue;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Input ended; let anything in flight settle before leaving.
                let settled = bench.pump_at(Instant::now() + SUGGESTION_DELAY);
                report(&bench, settled);
                let finished = bench.wait(wait);
                report(&bench, finished);
                break;
            }
        }
        let events = bench.pump_at(Instant::now());
        if !events.is_empty() {
            report(&bench, events);
            show_prompt()?;
        }
    }
    Ok(0)
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("mediakit-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        })
        .context("failed to start stdin reader")?;
    Ok(rx)
}

fn show_prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn handle_command(
    bench: &mut Workbench,
    command: &ShellCommand,
    clipboard: &SystemClipboard,
) -> Result<Flow> {
    let now = Instant::now();
    let value = command.arg_str("value").trim();
    match command.action.as_str() {
        "noop" => {}
        "quit" => return Ok(Flow::Quit),
        "help" => println!("Commands: {}", SHELL_HELP_COMMANDS.join(" ")),
        "presets" => print_presets(),
        "tips" => {
            for tip in TIPS {
                println!("- {}: {}", tip.title, tip.body);
            }
        }
        "status" => print_status(bench, now),
        "switch_tab" => match Tab::from_name(value) {
            Some(tab) => {
                if bench.switch(tab) {
                    print_tab(tab);
                } else {
                    println!("Already on {}.", tab.label());
                }
            }
            None => println!(
                "Unknown tab '{value}'. Tabs: {}",
                Tab::ALL.map(Tab::id).join(", ")
            ),
        },
        "set_text" => {
            let text = command.text.as_deref().unwrap_or_default();
            if !bench.set_text(text) {
                println!("The prompt is read-only while a suggestion is being applied.");
            }
        }
        "load_image" => {
            let path = command.arg_str("path");
            if path.is_empty() {
                println!("/load requires a path");
            } else {
                load_into(bench, PathBuf::from(path));
            }
        }
        "paste_image" => match clipboard.read_image() {
            Ok(Some(source)) => match bench.paste(source) {
                PasteOutcome::Accepted => println!("Image pasted."),
                PasteOutcome::Ignored => println!("Paste ignored on this tab."),
                PasteOutcome::Rejected(message) => println!("Error: {message}"),
            },
            Ok(None) => println!("The clipboard does not hold an image."),
            Err(err) => println!("Paste failed: {err:#}"),
        },
        "clear_all" => {
            bench.clear_all();
            println!("Cleared.");
        }
        "enhance" => start_enhance(bench),
        "unknown" => println!(
            "Unknown command: /{}. Type /help for commands.",
            command.arg_str("command")
        ),
        action => handle_panel_command(bench, action, value, command, clipboard, now),
    }
    Ok(Flow::Continue)
}

fn handle_panel_command(
    bench: &mut Workbench,
    action: &str,
    value: &str,
    command: &ShellCommand,
    clipboard: &SystemClipboard,
    now: Instant,
) {
    match (bench.panel_mut(), action) {
        (MountedPanel::Enhancer(panel), "clear_image") => {
            panel.clear_image();
            println!("Image cleared.");
        }
        (MountedPanel::Enhancer(panel), "set_prompt") => {
            if !panel.set_prompt(value) {
                println!("The prompt is read-only while a suggestion is being applied.");
            }
        }
        (MountedPanel::Enhancer(panel), "select_factor") => {
            let factor = value.trim_end_matches(['x', 'X']).parse::<f64>().ok();
            match factor {
                Some(factor) if panel.select_upscale_factor(factor, now) => {
                    println!("Upscale factor set to {factor}x.");
                }
                _ => println!("Unsupported factor '{value}'. Use 1 or 2."),
            }
        }
        (MountedPanel::Enhancer(panel), "apply_suggestion") => {
            if panel.apply_suggestion(value, now) {
                println!("Applying suggestion...");
            } else {
                println!("Unknown suggestion '{value}'. See /presets.");
            }
        }
        (MountedPanel::Enhancer(panel), "download") => {
            let target = command.arg_str("path");
            let target = (!target.is_empty()).then(|| Path::new(target));
            match panel.download(target) {
                Ok(path) => println!("Saved {}", path.display()),
                Err(err) => println!("Download failed: {err:#}"),
            }
        }
        (MountedPanel::ImageToText(panel), "clear_image") => {
            panel.clear_image();
            println!("Image cleared.");
        }
        (MountedPanel::ImageToText(panel), "describe") => {
            if !panel.can_describe() {
                println!("Load an image first (or wait for the current description).");
            } else {
                panel.generate_description();
                println!("Generating description...");
            }
        }
        (MountedPanel::ImageToText(panel), "set_base_prompt") => panel.set_base_prompt(value),
        (MountedPanel::ImageToText(panel), "set_negative_prompt") => {
            panel.set_negative_prompt(value)
        }
        (MountedPanel::ImageToText(panel), "select_model") => {
            if panel.select_model_by_name(value) {
                println!("Target model: {}", panel.target_model().display_name());
            } else {
                println!("Unknown model '{value}'. Models: flux, qwen, sdxl.");
            }
        }
        (MountedPanel::ImageToText(panel), "toggle_style") => match panel.toggle_style(value) {
            Some(_) => println!("Styles: {}", or_none(&panel.joined_styles())),
            None => println!("Unknown style '{value}'. See /presets."),
        },
        (MountedPanel::ImageToText(panel), "clear_styles") => {
            panel.clear_styles();
            println!("Styles cleared.");
        }
        (MountedPanel::ImageToText(panel), "copy") => {
            let name = if value.is_empty() { "positive" } else { value };
            match CopyTarget::from_name(name) {
                Some(target) => print_copy(panel.copy(target, clipboard, now)),
                None => println!("Copy what? Use description, positive or negative."),
            }
        }
        (MountedPanel::CameraMotion(panel), "set_scene") => {
            panel.set_scene(value);
            println!("{}", panel.composite());
        }
        (MountedPanel::CameraMotion(panel), "select_motion") => {
            if panel.select_motion(value) {
                println!("{}", panel.composite());
            } else {
                println!("Unknown motion '{value}'. See /presets.");
            }
        }
        (MountedPanel::CameraMotion(panel), "copy") => print_copy(panel.copy(clipboard, now)),
        (panel, _) => {
            let tab = panel.controller().tab();
            println!(
                "/{} is not available on the {} tab.",
                command_word(command),
                tab.label()
            );
        }
    }
}

fn command_word(command: &ShellCommand) -> &str {
    command
        .raw
        .trim()
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default()
}

fn load_into(bench: &mut Workbench, path: PathBuf) {
    let source = ImageSource::File(path);
    let loaded = match bench.panel_mut() {
        MountedPanel::Enhancer(panel) => panel.accept_image(&source),
        MountedPanel::ImageToText(panel) => panel.accept_image(&source),
        MountedPanel::CameraMotion(_) => {
            println!("This tab does not take images.");
            return;
        }
    };
    if loaded {
        println!("Loaded {}.", source.label());
    } else {
        println!("Error: {}", bench.error().unwrap_or_default());
    }
}

fn start_enhance(bench: &mut Workbench) {
    let started = match bench.panel_mut() {
        MountedPanel::Enhancer(panel) => panel.submit(),
        MountedPanel::ImageToText(panel) => panel.enhance_prompt(),
        MountedPanel::CameraMotion(panel) => panel.enhance(),
    };
    if started {
        println!("Working...");
    } else if let Some(message) = bench.error() {
        println!("Error: {message}");
    } else if bench.is_busy() {
        println!("Still working on the previous request.");
    } else {
        println!("Nothing to enhance yet.");
    }
}

fn report(bench: &Workbench, events: Vec<PanelEvent>) {
    for event in events {
        match event {
            PanelEvent::SuggestionApplied { name } => println!("\nSuggestion applied: {name}"),
            PanelEvent::Failed { message, .. } => println!("\nError: {message}"),
            PanelEvent::Completed { slot } => print_completion(bench, slot),
        }
    }
}

fn print_completion(bench: &Workbench, slot: &str) {
    match (bench.panel(), slot) {
        (MountedPanel::Enhancer(panel), _) => {
            let size = panel
                .enhanced()
                .and_then(|image| transcoder::dimensions(image).ok())
                .map(|(w, h)| format!(" ({w}x{h})"))
                .unwrap_or_default();
            println!("\nEnhanced image ready{size}. Use /download [path] to save it.");
        }
        (MountedPanel::ImageToText(panel), "describe_image") => {
            println!("\nDescription:\n{}", panel.description());
        }
        (MountedPanel::ImageToText(panel), _) => {
            println!("\nPositive prompt:\n{}", panel.positive_output());
            println!("\nNegative prompt:\n{}", panel.negative_output());
        }
        (MountedPanel::CameraMotion(panel), _) => {
            println!("\nEnhanced prompt:\n{}", panel.composite());
        }
    }
}

fn print_copy(status: Option<CopyStatus>) {
    match status {
        Some(status) => println!("{}", status.label()),
        None => println!("Nothing to copy."),
    }
}

fn print_tab(tab: Tab) {
    println!("[{}]", tab.label());
}

fn print_status(bench: &Workbench, now: Instant) {
    print_tab(bench.active_tab());
    match bench.panel() {
        MountedPanel::Enhancer(panel) => {
            println!("image: {}", describe_image(panel.original()));
            println!("factor: {}x", panel.upscale_factor());
            match panel.pending_suggestion() {
                Some(name) => println!("prompt: (applying {name}...)"),
                None => println!("prompt: {}", panel.prompt()),
            }
            println!("status: {}", status_text(panel.status()));
            println!("result: {}", describe_image(panel.enhanced()));
        }
        MountedPanel::ImageToText(panel) => {
            println!("image: {}", describe_image(panel.image()));
            println!("describe: {}", status_text(panel.describe_status()));
            println!("description: {}", or_none(panel.description()));
            println!("base: {}", or_none(panel.base_prompt()));
            println!("negative hints: {}", or_none(panel.negative_prompt()));
            println!("model: {}", panel.target_model().display_name());
            println!("styles: {}", or_none(&panel.joined_styles()));
            println!("prompt: {}", status_text(panel.prompt_status()));
            println!("positive: {}", or_none(panel.positive_output()));
            println!("negative: {}", or_none(panel.negative_output()));
            for target in [CopyTarget::Description, CopyTarget::Positive, CopyTarget::Negative] {
                if let Some(status) = panel.copy_status(target, now) {
                    println!("copy {target:?}: {}", status.label());
                }
            }
        }
        MountedPanel::CameraMotion(panel) => {
            println!("scene: {}", or_none(panel.scene()));
            println!(
                "motion: {}",
                panel.motion().map(|motion| motion.name).unwrap_or("(none)")
            );
            println!("status: {}", status_text(panel.status()));
            println!("prompt: {}", panel.composite());
            if let Some(status) = panel.copy_status(now) {
                println!("copy: {}", status.label());
            }
        }
    }
}

fn describe_image(image: Option<&UploadedImage>) -> String {
    match image {
        Some(image) => match transcoder::dimensions(image) {
            Ok((w, h)) => format!("{} {w}x{h}", image.mime_type),
            Err(_) => image.mime_type.clone(),
        },
        None => "(none)".to_string(),
    }
}

fn status_text(status: &UiStatus) -> String {
    match status {
        UiStatus::Idle => "idle".to_string(),
        UiStatus::Loading => "loading".to_string(),
        UiStatus::Error(message) => format!("error: {message}"),
    }
}

fn or_none(text: &str) -> &str {
    if text.is_empty() {
        "(none)"
    } else {
        text
    }
}

fn print_presets() {
    println!("Suggestions:");
    for suggestion in SUGGESTIONS {
        println!("  {}", suggestion.name);
    }
    println!("Upscale options:");
    for option in UPSCALE_OPTIONS {
        println!("  {} ({}x)", option.name, option.scale_factor.unwrap_or(1.0));
    }
    println!("Camera motions:");
    for motion in CAMERA_MOTIONS {
        println!("  {}", motion.name);
    }
    println!("Art styles:");
    println!("  {}", ART_STYLES.join(", "));
    println!("Target models:");
    for model in TargetModel::ALL {
        println!("  {} ({})", model.id(), model.display_name());
    }
}

/// System clipboard through `clipboard-rs`. A context is opened per operation.
struct SystemClipboard;

impl SystemClipboard {
    fn context() -> Result<ClipboardContext> {
        ClipboardContext::new().map_err(|err| anyhow!("clipboard unavailable: {err}"))
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        Self::context()?
            .set_text(text.to_string())
            .map_err(|err| anyhow!("clipboard write failed: {err}"))
    }
}

impl ClipboardImageSource for SystemClipboard {
    fn read_image(&self) -> Result<Option<ImageSource>> {
        let context = Self::context()?;
        if !context.has(ContentFormat::Image) {
            return Ok(None);
        }
        let image = context
            .get_image()
            .map_err(|err| anyhow!("clipboard read failed: {err}"))?;
        let png = image
            .to_png()
            .map_err(|err| anyhow!("clipboard image conversion failed: {err}"))?;
        Ok(Some(ImageSource::Clipboard {
            mime_type: Some("image/png".to_string()),
            bytes: png.get_bytes().to_vec(),
        }))
    }
}
