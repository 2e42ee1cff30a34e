use crate::TextRange;

/// Which comment grammar a file is lexed with.
///
/// Selected from the lowercased file extension; files with an unknown
/// extension are not lexed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSyntax {
    CFamily,
    Python,
}

const C_FAMILY_EXTENSIONS: &[&str] = &[
    "c", "h", "cpp", "cc", "hpp", "java", "js", "ts", "tsx", "go", "rs", "cs", "kt", "swift",
    "php", "rb", "scala", "m", "mm",
];

impl CommentSyntax {
    /// Pick the grammar for a file name, or `None` when the extension is not
    /// recognized.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        let extension = extension.to_lowercase();

        if extension == "py" {
            Some(Self::Python)
        } else if C_FAMILY_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::CFamily)
        } else {
            None
        }
    }
}

/// Lex `text` into non-overlapping comment ranges, in source order.
///
/// Ranges cover the opening delimiter through the character that ends the
/// comment: inclusive for block and triple-quote comments, up to but
/// excluding the terminating newline for line comments. A comment still open
/// at end of input is closed at `len`.
///
/// Offsets are char offsets into `text`.
pub fn comment_ranges(text: &str, file_name: &str) -> Vec<TextRange> {
    match CommentSyntax::from_file_name(file_name) {
        Some(CommentSyntax::CFamily) => lex_c_family(text),
        Some(CommentSyntax::Python) => lex_python(text),
        None => Vec::new(),
    }
}

#[derive(Clone, Copy)]
enum CState {
    Code,
    LineComment,
    BlockComment,
    Quoted { delimiter: char, escaped: bool },
}

/// Single pass over `//`, `/* */`, and the three quote forms (`'`, `"`,
/// `` ` ``). Quoted states honor backslash escapes and survive newlines; the
/// lexer recovers from malformed input at end of text rather than resetting
/// mid-stream.
fn lex_c_family(text: &str) -> Vec<TextRange> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut ranges = Vec::new();
    let mut state = CState::Code;
    let mut comment_start = 0;
    let mut i = 0;

    while i < len {
        let char = chars[i];
        match state {
            CState::Code => {
                if char == '/' && chars.get(i + 1) == Some(&'/') {
                    state = CState::LineComment;
                    comment_start = i;
                    i += 2;
                    continue;
                }
                if char == '/' && chars.get(i + 1) == Some(&'*') {
                    state = CState::BlockComment;
                    comment_start = i;
                    i += 2;
                    continue;
                }
                if matches!(char, '\'' | '"' | '`') {
                    state = CState::Quoted {
                        delimiter: char,
                        escaped: false,
                    };
                }
                i += 1;
            }
            CState::LineComment => {
                if char == '\n' {
                    // Newline excluded from the range
                    ranges.push(TextRange::new(comment_start, i));
                    state = CState::Code;
                }
                i += 1;
            }
            CState::BlockComment => {
                if char == '*' && chars.get(i + 1) == Some(&'/') {
                    ranges.push(TextRange::new(comment_start, i + 2));
                    state = CState::Code;
                    i += 2;
                    continue;
                }
                i += 1;
            }
            CState::Quoted { delimiter, escaped } => {
                state = if escaped {
                    CState::Quoted {
                        delimiter,
                        escaped: false,
                    }
                } else if char == '\\' {
                    CState::Quoted {
                        delimiter,
                        escaped: true,
                    }
                } else if char == delimiter {
                    CState::Code
                } else {
                    CState::Quoted {
                        delimiter,
                        escaped: false,
                    }
                };
                i += 1;
            }
        }
    }

    // Unterminated comments close at end of input
    if matches!(state, CState::LineComment | CState::BlockComment) {
        ranges.push(TextRange::new(comment_start, len));
    }

    ranges
}

#[derive(Clone, Copy)]
enum PyState {
    Code,
    LineComment,
    Quoted { delimiter: char, escaped: bool },
    Triple { delimiter: char, escaped: bool },
}

/// Single pass over `#` line comments and the four string forms. Triple
/// quotes are matched before single quotes at the same position and are
/// recorded as comment ranges, delimiter to delimiter inclusive.
fn lex_python(text: &str) -> Vec<TextRange> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut ranges = Vec::new();
    let mut state = PyState::Code;
    let mut comment_start = 0;
    let mut i = 0;

    let triple_at = |chars: &[char], i: usize, quote: char| {
        chars.get(i) == Some(&quote)
            && chars.get(i + 1) == Some(&quote)
            && chars.get(i + 2) == Some(&quote)
    };

    while i < len {
        let char = chars[i];
        match state {
            PyState::Code => {
                if char == '#' {
                    state = PyState::LineComment;
                    comment_start = i;
                    i += 1;
                    continue;
                }
                if char == '\'' || char == '"' {
                    if triple_at(&chars, i, char) {
                        state = PyState::Triple {
                            delimiter: char,
                            escaped: false,
                        };
                        comment_start = i;
                        i += 3;
                    } else {
                        state = PyState::Quoted {
                            delimiter: char,
                            escaped: false,
                        };
                        i += 1;
                    }
                    continue;
                }
                i += 1;
            }
            PyState::LineComment => {
                if char == '\n' {
                    ranges.push(TextRange::new(comment_start, i));
                    state = PyState::Code;
                }
                i += 1;
            }
            PyState::Quoted { delimiter, escaped } => {
                state = if escaped {
                    PyState::Quoted {
                        delimiter,
                        escaped: false,
                    }
                } else if char == '\\' {
                    PyState::Quoted {
                        delimiter,
                        escaped: true,
                    }
                } else if char == delimiter {
                    PyState::Code
                } else {
                    PyState::Quoted {
                        delimiter,
                        escaped: false,
                    }
                };
                i += 1;
            }
            PyState::Triple { delimiter, escaped } => {
                if escaped {
                    state = PyState::Triple {
                        delimiter,
                        escaped: false,
                    };
                    i += 1;
                } else if char == '\\' {
                    state = PyState::Triple {
                        delimiter,
                        escaped: true,
                    };
                    i += 1;
                } else if triple_at(&chars, i, delimiter) {
                    ranges.push(TextRange::new(comment_start, i + 3));
                    state = PyState::Code;
                    i += 3;
                } else {
                    i += 1;
                }
            }
        }
    }

    if matches!(
        state,
        PyState::LineComment | PyState::Triple { .. }
    ) {
        ranges.push(TextRange::new(comment_start, len));
    }

    ranges
}
