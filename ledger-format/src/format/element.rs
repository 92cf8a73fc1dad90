//! Format string compiler
//!
//! A format string is scanned once into a flat list of [`Element`]s. `%` and
//! `\` are the only control characters; everything between them is literal
//! text. A `%` directive reads as
//!
//! ```text
//! %[-!]*[min][.max](selector | (expr) | [date format] | x[BbEe] | %)
//! ```

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{FormatError, FormatResult, MAX_WIDTH};

bitflags! {
    /// Presentation flags of a directive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Pad on the right instead of the left (`-`)
        const ALIGN_LEFT = 0x01;
        /// Colour the value by its sign (`!`)
        const HIGHLIGHT  = 0x02;
    }
}

/// What a directive renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Fixed text
    Literal(String),
    /// `%(expr)`: a value expression evaluated per record
    ValueExpr(String),
    /// `%[fmt]` with its own date format, or `%D` using the configured one
    Date(Option<String>),
    /// `%d`: actual date, followed by `=effective` when that differs
    CompleteDate,
    /// `%S`: journal source path of the entry
    Source,
    /// `%B`
    EntryBegPos,
    /// `%b`
    EntryBegLine,
    /// `%E`
    EntryEndPos,
    /// `%e`
    EntryEndLine,
    /// `%xB`
    XactBegPos,
    /// `%xb`
    XactBegLine,
    /// `%xE`
    XactEndPos,
    /// `%xe`
    XactEndLine,
    /// `%X`: the transaction's clearing marker
    Cleared,
    /// `%Y`: the entry's clearing marker
    EntryCleared,
    /// `%C`
    Code,
    /// `%P`
    Payee,
    /// `%W`: account name prefixed by the state when the entry has none
    OptAccount,
    /// `%a`: account name up to the nearest displayed ancestor
    AccountName,
    /// `%A`
    AccountFullname,
    /// `%t`
    Amount,
    /// `%o`: amount with its per-unit cost, elided for a mirrored posting
    OptAmount,
    /// `%T`
    Total,
    /// `%N`
    Note,
    /// `%n`: note introduced by `  ; `
    OptNote,
    /// `%|`
    Spacer,
    /// `%_`: indentation by displayed ancestors
    DepthSpacer,
    /// A selector no field answers to; renders as a blank field
    Unknown(char),
}

/// One compiled directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// What to render
    pub kind: ElementKind,
    /// Alignment and highlight flags
    pub flags: ElementFlags,
    /// Pad to at least this many characters; 0 for none
    pub min_width: usize,
    /// Cut to at most this many characters; 0 for no limit
    pub max_width: usize,
}

impl Element {
    /// A plain literal element
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Literal(text.into()))
    }

    /// An element without flags or widths
    pub fn new(kind: ElementKind) -> Self {
        Self { kind, flags: ElementFlags::empty(), min_width: 0, max_width: 0 }
    }

    /// Check if specific flags are set
    pub fn has_flags(&self, flags: ElementFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// A compiled format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    elements: Vec<Element>,
    source: String,
}

impl Format {
    /// Compile a format string
    ///
    /// Fails only on an unclosed `%(` or `%[` and on widths of
    /// [`MAX_WIDTH`] or more. A dangling `%`, `%x` or `\` at the end of the
    /// input ends compilation quietly.
    pub fn parse(text: &str) -> FormatResult<Self> {
        let chars: Vec<char> = text.chars().collect();
        let mut elements = Vec::new();
        let mut literal = String::new();
        let mut p = 0;

        while p < chars.len() {
            let c = chars[p];
            if c != '%' && c != '\\' {
                literal.push(c);
                p += 1;
                continue;
            }

            if !literal.is_empty() {
                elements.push(Element::literal(std::mem::take(&mut literal)));
            }

            p += 1;
            if c == '\\' {
                if let Some(escaped) = chars.get(p).copied().and_then(unescape) {
                    elements.push(Element::literal(escaped));
                }
                p += 1;
                continue;
            }

            let mut element = Element::new(ElementKind::Literal(String::new()));
            while let Some(&flag) = chars.get(p) {
                match flag {
                    '-' => element.flags |= ElementFlags::ALIGN_LEFT,
                    '!' => element.flags |= ElementFlags::HIGHLIGHT,
                    _ => break,
                }
                p += 1;
            }

            element.min_width = read_width(&chars, &mut p)?;
            if chars.get(p) == Some(&'.') {
                p += 1;
                element.max_width = read_width(&chars, &mut p)?;
                if element.min_width == 0 {
                    element.min_width = element.max_width;
                }
            }

            let Some(&selector) = chars.get(p) else {
                break;
            };
            element.kind = match selector {
                '%' => ElementKind::Literal("%".to_string()),
                '(' => {
                    p += 1;
                    let (inner, end) = read_nested(&chars, p, '(', ')')?;
                    p = end;
                    ElementKind::ValueExpr(inner)
                }
                '[' => {
                    p += 1;
                    let (inner, end) = read_nested(&chars, p, '[', ']')?;
                    p = end;
                    ElementKind::Date(Some(inner))
                }
                'x' => {
                    p += 1;
                    match chars.get(p) {
                        None => break,
                        Some('B') => ElementKind::XactBegPos,
                        Some('b') => ElementKind::XactBegLine,
                        Some('E') => ElementKind::XactEndPos,
                        Some('e') => ElementKind::XactEndLine,
                        Some(_) => unknown_selector('x', text),
                    }
                }
                other => field_kind(other).unwrap_or_else(|| unknown_selector(other, text)),
            };
            elements.push(element);
            p += 1;
        }

        if !literal.is_empty() {
            elements.push(Element::literal(literal));
        }

        debug!("Compiled format {:?} into {} elements", text, elements.len());
        Ok(Self { elements, source: text.to_string() })
    }

    /// Compiled directives in output order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Text the format was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check if the format produces no output
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn field_kind(selector: char) -> Option<ElementKind> {
    let kind = match selector {
        'd' => ElementKind::CompleteDate,
        'D' => ElementKind::Date(None),
        'S' => ElementKind::Source,
        'B' => ElementKind::EntryBegPos,
        'b' => ElementKind::EntryBegLine,
        'E' => ElementKind::EntryEndPos,
        'e' => ElementKind::EntryEndLine,
        'X' => ElementKind::Cleared,
        'Y' => ElementKind::EntryCleared,
        'C' => ElementKind::Code,
        'P' => ElementKind::Payee,
        'W' => ElementKind::OptAccount,
        'a' => ElementKind::AccountName,
        'A' => ElementKind::AccountFullname,
        't' => ElementKind::Amount,
        'o' => ElementKind::OptAmount,
        'T' => ElementKind::Total,
        'N' => ElementKind::Note,
        'n' => ElementKind::OptNote,
        '|' => ElementKind::Spacer,
        '_' => ElementKind::DepthSpacer,
        _ => return None,
    };
    Some(kind)
}

fn unknown_selector(selector: char, text: &str) -> ElementKind {
    warn!("Unknown format selector '%{}' in {:?}; rendering a blank field", selector, text);
    ElementKind::Unknown(selector)
}

fn unescape(c: char) -> Option<char> {
    match c {
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{b}'),
        _ => None,
    }
}

fn read_width(chars: &[char], p: &mut usize) -> FormatResult<usize> {
    let mut width: usize = 0;
    while let Some(digit) = chars.get(*p).and_then(|c| c.to_digit(10)) {
        width = width.saturating_mul(10).saturating_add(digit as usize);
        *p += 1;
    }
    if width >= MAX_WIDTH {
        return Err(FormatError::WidthTooLarge(width));
    }
    Ok(width)
}

/// Read up to the delimiter closing an already opened one, returning the
/// inner text and the closing delimiter's position
fn read_nested(chars: &[char], start: usize, open: char, close: char) -> FormatResult<(String, usize)> {
    let mut depth = 1;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok((chars[start..i].iter().collect(), i));
            }
        } else if c == open {
            depth += 1;
        }
    }
    Err(FormatError::MissingDelimiter(close))
}
