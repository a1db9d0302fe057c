mod command;
mod decode;
mod encode;
mod tokenizer;

pub use command::{Command, MAX_SCENARIO_NAME_LEN, MAX_SPEED, MAX_SPRITE_NAME_LEN, MIN_SPEED};
pub use decode::{decode_line, read_script, resolve_save_index};
pub use encode::{write_script, NO_SAVE_PLACEHOLDER, NO_SCENARIO_PLACEHOLDER};
pub use tokenizer::{LineTokenizer, ScriptLine, MAX_TOKEN_LEN, TOKENS_PER_LINE};
