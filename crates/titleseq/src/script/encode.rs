use super::command::Command;

pub const NO_SAVE_PLACEHOLDER: &str = "<No save file>";
pub const NO_SCENARIO_PLACEHOLDER: &str = "<No scenario name>";

/// Renders the canonical script text: one header comment, then one line per command.
///
/// Commands without a textual form (`Undefined`, `Loop`, `EndLoop`) still emit an
/// empty line.
pub fn write_script(name: &str, commands: &[Command], saves: &[String]) -> String {
    let mut output = format!("# SCRIPT FOR {name}\n");
    for command in commands {
        output.push_str(&command_line(command, saves));
        output.push('\n');
    }
    output
}

fn command_line(command: &Command, saves: &[String]) -> String {
    match command {
        Command::Load { save_index } => {
            let save = save_index
                .and_then(|index| saves.get(index))
                .map(String::as_str)
                .unwrap_or(NO_SAVE_PLACEHOLDER);
            format!("LOAD {save}")
        }
        Command::LoadScenario { scenario_name } if scenario_name.is_empty() => {
            format!("LOADSC {NO_SCENARIO_PLACEHOLDER}")
        }
        Command::LoadScenario { scenario_name } => format!("LOADSC {scenario_name}"),
        Command::Location { x, y } => format!("LOCATION {x} {y}"),
        Command::Rotate { rotations } => format!("ROTATE {rotations}"),
        Command::Zoom { zoom } => format!("ZOOM {zoom}"),
        Command::Speed { speed } => format!("SPEED {speed}"),
        Command::Follow {
            sprite_index,
            sprite_name,
        } => format!("FOLLOW {sprite_index} {sprite_name}"),
        Command::Wait { milliseconds } => format!("WAIT {milliseconds}"),
        Command::Restart => "RESTART".to_string(),
        Command::End => "END".to_string(),
        Command::Undefined | Command::Loop | Command::EndLoop => String::new(),
    }
}
