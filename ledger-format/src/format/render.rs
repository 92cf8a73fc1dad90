//! Rendering compiled formats against report records
//!
//! Each element is turned into text, padded to its minimum width and cut to
//! its maximum width, then written to the sink. Fields whose record is not
//! in scope render their empty default instead of failing; the only errors
//! come from value expressions and from the sink itself.

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use console::Style;
use log::{trace, warn};

use super::element::{Element, ElementFlags, ElementKind, Format};
use super::truncate::Truncator;
use crate::config::FormatConfig;
use crate::details::Details;
use crate::error::ReportResult;
use crate::expr::{ExprError, Value, ValueExpr};
use crate::journal::{Account, AccountId, TransactionFlags};
use crate::xdata::{AccountDisplay, XactDisplay};

/// Writes formats for records, carrying the report configuration
#[derive(Debug, Clone)]
pub struct Renderer {
    config: FormatConfig,
    truncator: Truncator,
    amount_expr: ValueExpr,
    total_expr: ValueExpr,
}

// Text of one element plus how the shared post-processing applies to it
struct Rendered {
    text: String,
    highlight: bool,
    sized: bool,
}

impl Rendered {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), highlight: false, sized: false }
    }

    fn sized(text: String) -> Self {
        Self { text, highlight: false, sized: true }
    }
}

impl Renderer {
    /// Create a renderer; fails if the amount or total expression is malformed
    pub fn new(config: FormatConfig) -> ReportResult<Self> {
        let amount_expr = ValueExpr::parse(&config.amount_expr)?.compile();
        let total_expr = ValueExpr::parse(&config.total_expr)?.compile();
        Ok(Self { truncator: config.truncator(), config, amount_expr, total_expr })
    }

    /// Expression behind `%T`, also used to compare account totals
    pub fn total_expr(&self) -> &ValueExpr {
        &self.total_expr
    }

    /// Render every element of `format` for the given record
    pub fn render<W: fmt::Write>(
        &self,
        format: &Format,
        details: &Details<'_>,
        out: &mut W,
    ) -> ReportResult<()> {
        for element in format.elements() {
            let rendered = self.element_text(element, details)?;
            let mut text = rendered.text;
            if !rendered.sized {
                text = pad(text, element);
                if element.max_width > 0 && text.chars().count() > element.max_width {
                    text = text.chars().take(element.max_width).collect();
                }
            }
            if rendered.highlight {
                text = Style::new().red().force_styling(true).apply_to(text).to_string();
            }
            trace!("Rendered {:?} as {:?}", element.kind, text);
            out.write_str(&text)?;
        }
        Ok(())
    }

    /// Render into a fresh string
    pub fn render_to_string(&self, format: &Format, details: &Details<'_>) -> ReportResult<String> {
        let mut out = String::new();
        self.render(format, details, &mut out)?;
        Ok(out)
    }

    fn element_text(&self, element: &Element, details: &Details<'_>) -> ReportResult<Rendered> {
        let entry = details.entry;
        let xact = details.xact;

        let rendered = match &element.kind {
            ElementKind::Literal(text) => Rendered::text(text.as_str()),
            ElementKind::ValueExpr(source) => {
                let value = ValueExpr::parse(source)?.compile().calc(details)?;
                self.value_text(element, &value)
            }
            ElementKind::Amount => self.value_text(element, &self.amount_expr.calc(details)?),
            ElementKind::Total => self.value_text(element, &self.total_expr.calc(details)?),

            ElementKind::Date(format) => {
                let format = format.as_deref().unwrap_or(&self.config.date_format);
                let text = details.report_date().map(|d| format_date(d, format)).unwrap_or_default();
                Rendered::text(self.limit(text, element.max_width, false))
            }
            ElementKind::CompleteDate => {
                let format = &self.config.date_format;
                let mut text = String::new();
                if let Some(actual) = details.report_date() {
                    text = format_date(actual, format);
                    if let Some(effective) = details.effective_date().filter(|e| *e != actual) {
                        text.push('=');
                        text.push_str(&format_date(effective, format));
                    }
                }
                Rendered::text(self.limit(text, element.max_width, false))
            }

            ElementKind::Source => Rendered::text(
                entry
                    .and_then(|e| e.src_idx)
                    .and_then(|idx| details.journal.sources.get(idx))
                    .map(|path| path.display().to_string())
                    .unwrap_or_default(),
            ),
            ElementKind::EntryBegPos => Rendered::text(display_or_empty(entry.map(|e| e.position.beg_pos))),
            ElementKind::EntryBegLine => Rendered::text(display_or_empty(entry.map(|e| e.position.beg_line))),
            ElementKind::EntryEndPos => Rendered::text(display_or_empty(entry.map(|e| e.position.end_pos))),
            ElementKind::EntryEndLine => Rendered::text(display_or_empty(entry.map(|e| e.position.end_line))),
            ElementKind::XactBegPos => Rendered::text(display_or_empty(xact.map(|x| x.position.beg_pos))),
            ElementKind::XactBegLine => Rendered::text(display_or_empty(xact.map(|x| x.position.beg_line))),
            ElementKind::XactEndPos => Rendered::text(display_or_empty(xact.map(|x| x.position.end_pos))),
            ElementKind::XactEndLine => Rendered::text(display_or_empty(xact.map(|x| x.position.end_line))),

            ElementKind::Cleared => Rendered::text(xact.map_or("", |x| x.state.marker())),
            ElementKind::EntryCleared => Rendered::text(
                entry.and_then(|e| details.journal.entry_state(e)).map_or("", |s| s.marker()),
            ),
            ElementKind::Code => Rendered::text(
                entry
                    .and_then(|e| e.code.as_ref())
                    .map(|code| format!("({}) ", code))
                    .unwrap_or_default(),
            ),
            ElementKind::Payee => Rendered::text(
                entry
                    .map(|e| self.limit(e.payee.to_string(), element.max_width, false))
                    .unwrap_or_default(),
            ),
            ElementKind::Note | ElementKind::OptNote => {
                let mut text = String::new();
                if let Some(note) = xact.and_then(|x| x.note.as_ref()) {
                    if element.kind == ElementKind::OptNote {
                        text.push_str("  ; ");
                    }
                    text.push_str(&self.limit(note.to_string(), element.max_width, false));
                }
                Rendered::text(text)
            }

            ElementKind::OptAccount | ElementKind::AccountName | ElementKind::AccountFullname => {
                Rendered::text(self.account_text(element, details))
            }
            ElementKind::OptAmount => Rendered::text(self.opt_amount_text(details)?),

            ElementKind::Spacer => Rendered::text(" "),
            ElementKind::DepthSpacer => {
                let unit = element.min_width.max(element.max_width).max(1);
                let depth = details.account.map_or(0, |a| displayed_ancestors(details, a));
                Rendered::sized(" ".repeat(unit * depth))
            }
            ElementKind::Unknown(_) => Rendered::text(""),
        };
        Ok(rendered)
    }

    fn value_text(&self, element: &Element, value: &Value) -> Rendered {
        let highlight = element.has_flags(ElementFlags::HIGHLIGHT)
            && self.config.ansi_codes
            && value.sign().is_some_and(|sign| if self.config.ansi_invert { sign > 0 } else { sign < 0 });

        let balance = match value {
            Value::Balance(balance) => Some(balance),
            Value::BalancePair(pair) => Some(pair.quantity()),
            _ => None,
        };
        let mut rendered = match balance {
            Some(balance) => {
                let latter = if element.max_width > 0 { element.max_width } else { element.min_width };
                let mut text = String::new();
                // Writing into a String cannot fail
                let _ = balance.print(&mut text, element.min_width, latter);
                Rendered::sized(text)
            }
            None => Rendered::text(match value {
                Value::DateTime(moment) => format_datetime(*moment, &self.config.date_format),
                other => other.to_string(),
            }),
        };
        rendered.highlight = highlight;
        rendered
    }

    fn account_text(&self, element: &Element, details: &Details<'_>) -> String {
        let Some(account) = details.account else {
            return " ".to_string();
        };

        let mut name = String::new();
        if element.kind == ElementKind::OptAccount {
            if let (Some(entry), Some(xact)) = (details.entry, details.xact) {
                if details.journal.entry_state(entry).is_none() {
                    name.push_str(xact.state.marker());
                }
            }
        }
        if element.kind == ElementKind::AccountFullname {
            name.push_str(&details.journal.fullname(account));
        } else {
            name.push_str(&partial_account_name(details, account));
        }

        match details.xact {
            Some(xact) if xact.has_flags(TransactionFlags::VIRTUAL) => {
                if element.max_width > 2 {
                    name = self.truncator.truncate(&name, element.max_width - 2, true);
                }
                if xact.has_flags(TransactionFlags::BALANCE) {
                    format!("[{}]", name)
                } else {
                    format!("({})", name)
                }
            }
            _ => self.limit(name, element.max_width, true),
        }
    }

    fn opt_amount_text(&self, details: &Details<'_>) -> ReportResult<String> {
        let Some(xact) = details.xact else {
            return Ok(String::new());
        };

        if let Some(cost) = xact.cost.as_ref().filter(|_| !xact.amount.is_zero()) {
            let per_unit = cost.per_unit(&xact.amount).map_err(ExprError::from)?;
            return Ok(format!("{} @ {}", xact.amount, per_unit.unrounded()));
        }

        if let Some(entry) = details.entry {
            let shown: Vec<_> = details
                .journal
                .entry_transactions(entry)
                .filter(|x| details.state.xact_has_flags(x.id, XactDisplay::TO_DISPLAY))
                .collect();
            if let [first, last] = shown.as_slice() {
                if last.id == xact.id && first.amount == last.amount.negated() {
                    return Ok(String::new());
                }
            }
        }
        Ok(xact.amount.to_string())
    }

    fn limit(&self, text: String, max_width: usize, is_path: bool) -> String {
        if max_width == 0 {
            text
        } else {
            self.truncator.truncate(&text, max_width, is_path)
        }
    }
}

fn pad(text: String, element: &Element) -> String {
    let len = text.chars().count();
    if len >= element.min_width {
        return text;
    }
    let fill = " ".repeat(element.min_width - len);
    if element.has_flags(ElementFlags::ALIGN_LEFT) {
        text + &fill
    } else {
        fill + &text
    }
}

fn display_or_empty<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_date(date: NaiveDate, format: &str) -> String {
    format_datetime(date.and_time(NaiveTime::MIN), format)
}

fn format_datetime(moment: NaiveDateTime, format: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!("Invalid date format {:?}; rendering an empty date", format);
        return String::new();
    }
    let mut text = String::new();
    if write!(text, "{}", moment.format_with_items(items.iter())).is_err() {
        warn!("Date format {:?} cannot be applied; rendering an empty date", format);
        return String::new();
    }
    text
}

/// Account path up to, not including, the nearest displayed ancestor
fn partial_account_name(details: &Details<'_>, account: &Account) -> String {
    if account.id == AccountId::DETACHED {
        return account.name.to_string();
    }
    let mut parts = Vec::new();
    let mut current = Some(account);
    while let Some(node) = current {
        let Some(parent) = node.parent else {
            break;
        };
        if details.state.account_has_flags(node.id, AccountDisplay::DISPLAYED) {
            break;
        }
        parts.push(node.name.as_str());
        current = Some(details.journal.account(parent));
    }
    parts.reverse();
    parts.join(":")
}

/// Number of displayed accounts on the path from `account` to the root
fn displayed_ancestors(details: &Details<'_>, account: &Account) -> usize {
    let mut count = 0;
    let mut current = Some(account);
    while let Some(node) = current {
        if details.state.account_has_flags(node.id, AccountDisplay::DISPLAYED) {
            count += 1;
        }
        current = node.parent.map(|parent| details.journal.account(parent));
    }
    count
}
