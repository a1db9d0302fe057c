pub const MAX_TOKEN_LEN: usize = 127;
pub const TOKENS_PER_LINE: usize = 3;

/// How a space byte is treated once the keyword of a line is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpaceMode {
    Separator,
    /// Save and scenario names may contain spaces.
    LoadArgument,
    /// Followed sprite names (third token only) may contain spaces.
    SpriteName,
}

const KEYWORD_SPACE_MODES: &[(&str, SpaceMode)] = &[
    ("LOAD", SpaceMode::LoadArgument),
    ("LOADSC", SpaceMode::LoadArgument),
    ("FOLLOW", SpaceMode::SpriteName),
];

impl SpaceMode {
    fn for_keyword(keyword: &[u8]) -> Self {
        KEYWORD_SPACE_MODES
            .iter()
            .find(|(name, _)| keyword.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, mode)| *mode)
            .unwrap_or(SpaceMode::Separator)
    }

    fn keeps_spaces(self, token_index: usize) -> bool {
        match self {
            SpaceMode::Separator => false,
            SpaceMode::LoadArgument => token_index >= 1,
            SpaceMode::SpriteName => token_index == 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptLine {
    pub tokens: [String; TOKENS_PER_LINE],
}

impl ScriptLine {
    pub fn keyword(&self) -> &str {
        &self.tokens[0]
    }

    pub fn arg(&self, index: usize) -> &str {
        self.tokens
            .get(index + 1)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Splits raw script bytes into lines of at most three tokens.
///
/// A line ends at `\n`, `\r` or the end of input. `#` starts a comment that runs to
/// the end of the line. Runs of separator spaces collapse into one. Once the
/// keyword is `LOAD`/`LOADSC` (any argument) or `FOLLOW` (sprite name only), every
/// space after the separator that opened that token is content, leading spaces
/// included. Tokens longer than [`MAX_TOKEN_LEN`] bytes are cut off and the
/// overflowing byte moves collection on to the next token. When the third token
/// closes before the line ends, the leftover bytes are read as the next line.
pub struct LineTokenizer<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> LineTokenizer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn next_line(&mut self) -> ScriptLine {
        let mut tokens: [Vec<u8>; TOKENS_PER_LINE] = Default::default();
        let mut token_index = 0usize;
        let mut whitespace_pending = true;
        let mut comment = false;
        let mut space_mode = SpaceMode::Separator;

        while token_index < TOKENS_PER_LINE {
            let Some(&byte) = self.bytes.get(self.cursor) else {
                break;
            };
            self.cursor += 1;
            if byte == b'\n' || byte == b'\r' {
                break;
            }
            if comment {
                continue;
            }
            if byte == b'#' {
                comment = true;
                continue;
            }
            if byte == b' ' && !space_mode.keeps_spaces(token_index) {
                if !whitespace_pending {
                    if token_index == 0 {
                        space_mode = SpaceMode::for_keyword(&tokens[0]);
                    }
                    token_index += 1;
                    whitespace_pending = true;
                }
                continue;
            }

            let token = &mut tokens[token_index];
            if token.len() < MAX_TOKEN_LEN {
                token.push(byte);
                whitespace_pending = false;
            } else {
                token_index += 1;
                whitespace_pending = true;
            }
        }

        ScriptLine {
            tokens: tokens.map(|token| String::from_utf8_lossy(&token).into_owned()),
        }
    }
}

impl Iterator for LineTokenizer<'_> {
    type Item = ScriptLine;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            None
        } else {
            Some(self.next_line())
        }
    }
}
