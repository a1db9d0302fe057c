use tracing::debug;

use super::command::Command;
use super::tokenizer::{LineTokenizer, ScriptLine};

/// Decodes a whole script. Lines that do not name a known command are dropped.
pub fn read_script(script: &[u8], saves: &[String]) -> Vec<Command> {
    let mut commands = Vec::new();
    for (line_index, line) in LineTokenizer::new(script).enumerate() {
        match decode_line(&line, saves) {
            Command::Undefined => {
                if !line.keyword().is_empty() {
                    debug!(
                        line = line_index + 1,
                        keyword = line.keyword(),
                        "script_line_dropped"
                    );
                }
            }
            command => commands.push(command),
        }
    }
    commands
}

pub fn decode_line(line: &ScriptLine, saves: &[String]) -> Command {
    let keyword = line.keyword().to_ascii_uppercase();
    match keyword.as_str() {
        "LOAD" => Command::Load {
            save_index: resolve_save_index(line.arg(0), saves),
        },
        "LOADSC" => Command::load_scenario(line.arg(0)),
        "LOCATION" => Command::Location {
            x: parse_int_prefix(line.arg(0)) as u8,
            y: parse_int_prefix(line.arg(1)) as u8,
        },
        "ROTATE" => Command::Rotate {
            rotations: parse_int_prefix(line.arg(0)) as u8,
        },
        "ZOOM" => Command::Zoom {
            zoom: parse_int_prefix(line.arg(0)) as u8,
        },
        "SPEED" => Command::speed(parse_int_prefix(line.arg(0)) as u8),
        "FOLLOW" => Command::follow(parse_int_prefix(line.arg(0)) as u16, line.arg(1)),
        "WAIT" => Command::Wait {
            milliseconds: parse_int_prefix(line.arg(0)) as u16,
        },
        "RESTART" => Command::Restart,
        "END" => Command::End,
        _ => Command::Undefined,
    }
}

/// First case-insensitive match in list order wins.
pub fn resolve_save_index(name: &str, saves: &[String]) -> Option<usize> {
    saves
        .iter()
        .position(|save| save.eq_ignore_ascii_case(name))
}

/// Leading-integer parse: optional whitespace and sign, then digits. Anything that
/// is not a number yields zero; overflow wraps. Callers narrow with `as`, which
/// keeps the low bits of the value.
pub(crate) fn parse_int_prefix(text: &str) -> i32 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, digit| {
            acc.wrapping_mul(10).wrapping_add(i32::from(digit - b'0'))
        });
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}
