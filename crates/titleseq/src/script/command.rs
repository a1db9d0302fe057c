use serde::Serialize;

pub const MAX_SCENARIO_NAME_LEN: usize = 63;
pub const MAX_SPRITE_NAME_LEN: usize = 31;

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 4;

/// One playback instruction of a title sequence script.
///
/// `Load` refers into the owning sequence's save list by position; `None` marks a
/// save that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Undefined,
    Load { save_index: Option<usize> },
    LoadScenario { scenario_name: String },
    Location { x: u8, y: u8 },
    Rotate { rotations: u8 },
    Zoom { zoom: u8 },
    Speed { speed: u8 },
    Follow { sprite_index: u16, sprite_name: String },
    Wait { milliseconds: u16 },
    Restart,
    End,
    // Retained for script compatibility; never produced by the decoder.
    Loop,
    EndLoop,
}

impl Command {
    pub fn is_load(&self) -> bool {
        matches!(self, Command::Load { .. } | Command::LoadScenario { .. })
    }

    pub fn speed(value: u8) -> Self {
        Command::Speed {
            speed: value.clamp(MIN_SPEED, MAX_SPEED),
        }
    }

    pub fn load_scenario(name: &str) -> Self {
        Command::LoadScenario {
            scenario_name: truncate_to(name, MAX_SCENARIO_NAME_LEN),
        }
    }

    pub fn follow(sprite_index: u16, name: &str) -> Self {
        Command::Follow {
            sprite_index,
            sprite_name: truncate_to(name, MAX_SPRITE_NAME_LEN),
        }
    }
}

/// Truncates to at most `max_bytes`, backing off to the nearest char boundary.
pub(crate) fn truncate_to(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_load_scenario_count_as_load_commands() {
        assert!(Command::Load { save_index: None }.is_load());
        assert!(Command::load_scenario("Forest Frontiers").is_load());
        assert!(!Command::Wait { milliseconds: 10 }.is_load());
        assert!(!Command::Restart.is_load());
    }

    #[test]
    fn speed_constructor_clamps() {
        assert_eq!(Command::speed(0), Command::Speed { speed: 1 });
        assert_eq!(Command::speed(200), Command::Speed { speed: 4 });
        assert_eq!(Command::speed(3), Command::Speed { speed: 3 });
    }

    #[test]
    fn string_fields_truncate_on_char_boundary() {
        let long = "é".repeat(40);
        let Command::Follow { sprite_name, .. } = Command::follow(1, &long) else {
            panic!("expected follow");
        };
        assert!(sprite_name.len() <= MAX_SPRITE_NAME_LEN);
        assert_eq!(sprite_name, "é".repeat(15));
    }
}
