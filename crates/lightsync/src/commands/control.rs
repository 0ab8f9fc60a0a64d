//! Write commands: thing state, buttons, and group actions.

use lightsync_core::{GroupAction, HttpThingsStore, ThingCommand};

use crate::cli::{GlobalOpts, GroupActionArg, GroupArgs, SetArgs};
use crate::error::CliError;

/// Lower `set` flags into commands, in a fixed order: state first, so a
/// following brightness wins the local `state` it implies.
fn commands(args: SetArgs) -> Vec<ThingCommand> {
    let mut commands = Vec::new();
    if args.on {
        commands.push(ThingCommand::SetState(true));
    }
    if args.off {
        commands.push(ThingCommand::SetState(false));
    }
    if let Some(level) = args.brightness {
        commands.push(ThingCommand::Brightness(level));
    }
    if let Some(mireds) = args.color_temp {
        commands.push(ThingCommand::ColorTemp(mireds));
    }
    if let Some(rgb) = args.color {
        commands.push(ThingCommand::ColorRgb(rgb));
    }
    if let Some(effect) = args.effect {
        commands.push(ThingCommand::Effect(effect));
    }
    commands
}

fn validate_rgb(rgb: &str) -> Result<(), CliError> {
    let hex = rgb.strip_prefix('#').unwrap_or(rgb);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }
    Err(CliError::Validation {
        field: "color".into(),
        reason: format!("expected #rrggbb, got '{rgb}'"),
    })
}

pub async fn set(store: &HttpThingsStore, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref rgb) = args.color {
        validate_rgb(rgb)?;
    }
    let name = args.name.clone();
    for command in commands(args) {
        tracing::debug!(thing = %name, ?command, "sending command");
        store.execute(&name, command).await?;
    }

    if !global.quiet {
        if let Some(thing) = store.snapshot().thing(&name) {
            eprintln!("{name}: {}", serde_json::Value::Object(thing.state.clone()));
        }
    }
    Ok(())
}

pub async fn press(store: &HttpThingsStore, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    store.press_button(name).await?;
    if !global.quiet {
        eprintln!("Pressed {name}");
    }
    Ok(())
}

pub async fn group(store: &HttpThingsStore, args: GroupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let action = match args.action {
        GroupActionArg::On => GroupAction::AllOn,
        GroupActionArg::Off => GroupAction::AllOff,
    };
    store.trigger_group_action(&args.name, action).await?;
    if !global.quiet {
        eprintln!("{}: {action}", args.name);
    }
    Ok(())
}
