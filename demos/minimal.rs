//! Minimal headless command tree example.
//!
//! Builds a small tree, feeds it console lines and prints the output.
//!
//! Run with: `cargo run --example minimal`

use bevy::prelude::*;
use bevy_command_tree::prelude::*;
use clap::{Arg, ArgAction};

fn main() {
    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(CommandTreePlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, send_test_commands.run_if(run_once))
        .add_systems(PostUpdate, (process_outputs, process_finished))
        .run();
}

fn setup(mut tree: ResMut<CommandTree>) -> Result {
    let aim = tree.build(
        CommandBuilder::new("aim")
            .description("Aim assist")
            .parent(CommandTree::GLOBAL),
    )?;

    tree.build(
        CommandBuilder::new("fov")
            .description("Field of view in degrees")
            .parent(aim)
            .setting(Setting::new(90.0f32).min(1.0).max(180.0)),
    )?;

    tree.build(
        CommandBuilder::new("smoothing")
            .description("Smooth aim movement")
            .parent(aim)
            .setting(Setting::new(false)),
    )?;

    tree.build(
        CommandBuilder::new("greet")
            .description("Greet someone")
            .parent(CommandTree::GLOBAL)
            .option(Arg::new("shout").long("shout").short('s').action(ArgAction::SetTrue))
            .help(|ctx| ctx.write("Say hello to someone, or to the world."))
            .processor(|ctx| {
                let name = ctx.get_or(0, "World").to_string();
                let mut line = format!("Hello, {}!", name);
                if ctx.options().has("shout") {
                    line = line.to_uppercase();
                }
                ctx.write(line);
                Ok(())
            })
            .callback(
                CallbackKind::Success,
                std::sync::Arc::new(|data: &CallbackData| info!("'{}' succeeded", data.name)),
            ),
    )?;

    println!("Command tree initialized with {} commands", tree.len());
    Ok(())
}

/// Send some test commands programmatically.
fn send_test_commands(mut input: MessageWriter<CommandInputEvent>) {
    println!("\n--- Sending test commands ---");

    // Read a setting, then set it through a prefix
    input.write(CommandInputEvent::new("aim fov"));
    input.write(CommandInputEvent::new("ai f 110"));

    // Options and arguments
    input.write(CommandInputEvent::new("greet Developer; greet --shout team"));
    input.write(CommandInputEvent::new("greet -?"));

    // Bool setting through a prefix, then an unknown command
    input.write(CommandInputEvent::new("aim s yes; teleport"));
}

/// Print output messages.
fn process_outputs(mut output: MessageReader<CommandOutputEvent>) {
    for event in output.read() {
        let prefix = match event.level {
            CommandOutputLevel::Debug => "[DEBUG]",
            CommandOutputLevel::Info => "[INFO]",
            CommandOutputLevel::Warn => "[WARN]",
            CommandOutputLevel::Error => "[ERROR]",
            CommandOutputLevel::Command => "[$]",
            CommandOutputLevel::Result => "[>]",
        };
        println!("{} {}", prefix, event.message);
    }
}

/// Print the final state of each command that ran.
fn process_finished(mut finished: MessageReader<CommandFinishedEvent>) {
    for event in finished.read() {
        println!("[done] {} -> {:?}", event.name, event.state);
    }
}
