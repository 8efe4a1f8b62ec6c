//! Boundary-aware history reconciliation.
//!
//! Before an undo, the applied part of the log is rewritten so that every record ends on a
//! lexical boundary of the markup: the end of a tag, a whitespace separator, or the start of
//! a run of edits. Undoing then removes a whole word, a whole tag or a whole element body
//! instead of a single keystroke.
//!
//! # Pipeline
//!
//! 1. **Normalize**: reduce each unreconciled record to its net insertion or deletion; drop
//!    records that change nothing. Replaces that cannot be reduced stay atomic.
//! 2. **Cancel**: remove adjacent same-offset records that undo each other (typing a
//!    character and immediately deleting it).
//! 3. **Scan**: starting from the latest unreconciled record, gather the contiguous run of
//!    insertions behind it and scan its text backwards for a boundary (see
//!    [`find_boundary`]). Deletions extend over contiguous deletions only.
//! 4. **Collapse**: replace the selected records with one reconciled record; repeat from 3
//!    until every applied record is reconciled.
//!
//! Boundaries only ever fall on record starts: a record produced by a single raw change (a
//! paste, a fast typing burst) is never split.

use crate::log::HistoryLog;
use crate::markup::{CharacterClass, is_line_break};
use crate::record::EditRecord;
use std::iter::Rev;
use std::str::Chars;

/// Counters describing what a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// No-op records removed during normalization.
    pub dropped: usize,
    /// Records removed because they cancelled each other out.
    pub cancelled: usize,
    /// Boundary-aligned records produced.
    pub collapsed: usize,
}

/// Rewrites the applied part of a [`HistoryLog`] into boundary-aligned records.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryReconciler;

impl BoundaryReconciler {
    /// Reconcile every unreconciled applied record of `log`.
    ///
    /// The redo tail is left untouched and the cursor ends at the tail of the rewritten
    /// applied prefix.
    pub fn reconcile(log: &mut HistoryLog) -> ReconcileReport {
        log.rewrite_applied(|records| {
            let mut report = ReconcileReport {
                dropped: normalize(records),
                cancelled: cancel_complementary(records),
                collapsed: 0,
            };
            // Work from the end: every record behind `top` is settled, newest first.
            let mut settled = Vec::with_capacity(records.len());
            while let Some(top) = records.len().checked_sub(1) {
                if records[top].reconciled {
                    settled.extend(records.pop());
                    continue;
                }
                let span = select_span(records, top);
                tracing::debug!(
                    from = span.from,
                    to = span.to,
                    start = span.record.start,
                    "collapsed history span"
                );
                records.truncate(span.from);
                settled.push(span.record);
                report.collapsed += 1;
            }
            settled.reverse();
            *records = settled;
            report
        })
    }
}

/// Reduce unreconciled records to net insertions/deletions; returns how many were dropped.
pub(crate) fn normalize(records: &mut Vec<EditRecord>) -> usize {
    let len = records.len();
    records.retain_mut(|record| record.reconciled || record.normalize());
    len - records.len()
}

/// Remove adjacent unreconciled records that undo each other; returns how many were removed.
pub(crate) fn cancel_complementary(records: &mut Vec<EditRecord>) -> usize {
    let mut kept: Vec<EditRecord> = Vec::with_capacity(records.len());
    let mut cancelled = 0;
    for record in records.drain(..) {
        let cancels = !record.reconciled
            && kept
                .last()
                .is_some_and(|prev| !prev.reconciled && prev.is_inverse_of(&record));
        if cancels {
            kept.pop();
            cancelled += 2;
        } else {
            kept.push(record);
        }
    }
    *records = kept;
    cancelled
}

struct Span {
    from: usize,
    to: usize,
    record: EditRecord,
}

fn select_span(records: &[EditRecord], top: usize) -> Span {
    let latest = &records[top];
    if latest.is_growth() {
        growth_span(records, top)
    } else if latest.is_shrink() {
        shrink_span(records, top)
    } else {
        Span {
            from: top,
            to: top,
            record: latest.clone().with_reconciled(true),
        }
    }
}

fn growth_span(records: &[EditRecord], top: usize) -> Span {
    let from = scan_back(RunChars::new(records, top)).unwrap_or(top);
    tracing::trace!(from, top, "growth run boundary");

    let after: String = records[from..=top]
        .iter()
        .map(|record| record.after.as_str())
        .collect();
    Span {
        from,
        to: top,
        record: EditRecord::insert(records[from].start, after).with_reconciled(true),
    }
}

/// Characters of the insertion run ending at `top`, newest first, each paired with the index
/// of the record that typed it. Records are only visited as far back as the scan asks.
#[derive(Clone)]
struct RunChars<'a> {
    records: &'a [EditRecord],
    owner: usize,
    chars: Rev<Chars<'a>>,
}

impl<'a> RunChars<'a> {
    fn new(records: &'a [EditRecord], top: usize) -> Self {
        Self {
            records,
            owner: top,
            chars: records[top].after.chars().rev(),
        }
    }
}

impl Iterator for RunChars<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records;
        loop {
            if let Some(ch) = self.chars.next() {
                return Some((self.owner, ch));
            }
            let prev = self.owner.checked_sub(1)?;
            if !continues_run(&records[prev], &records[self.owner]) {
                return None;
            }
            self.owner = prev;
            self.chars = records[prev].after.chars().rev();
        }
    }
}

fn continues_run(prev: &EditRecord, next: &EditRecord) -> bool {
    !prev.reconciled && prev.is_growth() && prev.after_end() == next.start
}

fn shrink_span(records: &[EditRecord], top: usize) -> Span {
    let mut merged = records[top].clone();
    let mut from = top;
    while from > 0 {
        let prev = &records[from - 1];
        if prev.reconciled || !prev.is_shrink() {
            break;
        }
        let mut candidate = prev.clone();
        if !candidate.absorb_deletion(&merged) {
            break;
        }
        merged = candidate;
        from -= 1;
    }
    Span {
        from,
        to: top,
        record: merged.with_reconciled(true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Scanning plain text.
    Text,
    /// Scanning backwards through a tag whose `>` was the last character typed.
    InTag {
        body_len: usize,
        /// Leftmost body character seen so far; `/` marks a closing tag.
        leading: Option<char>,
    },
}

/// Index into `chars` where an undo of this run of typed text should start.
///
/// `chars` is the text of a contiguous run of insertions, oldest first. The scan starts at
/// the last character:
///
/// - a separator or a lone `<` is undone on its own;
/// - a `>` starts a tag scan: reaching the `<` of an opening tag stops there, while a
///   closing tag keeps going through the element body to the end of the previous tag;
/// - any other character extends back to the nearest separator, `<`, or the `>` of a
///   complete tag.
///
/// Returns `0` when no boundary is found.
pub fn find_boundary(chars: &[char]) -> usize {
    scan_back(chars.iter().copied().enumerate().rev()).unwrap_or(0)
}

/// Backward boundary scan over `(key, char)` pairs, newest character first.
///
/// Returns the key of the boundary character, or the key of the oldest character when the
/// input runs out first; `None` only for empty input. Stops reading at the boundary.
fn scan_back<K, I>(mut chars: I) -> Option<K>
where
    K: Copy,
    I: Iterator<Item = (K, char)> + Clone,
{
    let (mut later, last) = chars.next()?;

    let mut state = match CharacterClass::of(last) {
        CharacterClass::Separator | CharacterClass::TagOpen => return Some(later),
        CharacterClass::TagClose => ScanState::InTag {
            body_len: 0,
            leading: None,
        },
        CharacterClass::Other => ScanState::Text,
    };

    while let Some((key, ch)) = chars.next() {
        state = match (state, CharacterClass::of(ch)) {
            (ScanState::InTag { body_len, leading }, CharacterClass::TagOpen) => {
                if body_len > 0 && leading != Some('/') {
                    return Some(key);
                }
                ScanState::Text
            }
            (ScanState::InTag { body_len, .. }, CharacterClass::Separator)
                if !is_line_break(ch) =>
            {
                ScanState::InTag {
                    body_len: body_len + 1,
                    leading: Some(ch),
                }
            }
            (ScanState::InTag { body_len, .. }, CharacterClass::Other) => ScanState::InTag {
                body_len: body_len + 1,
                leading: Some(ch),
            },
            (_, CharacterClass::Separator) => return Some(key),
            (_, CharacterClass::TagClose) => {
                // The boundary sits right after a complete tag.
                if closes_tag(chars.clone()) {
                    return Some(later);
                }
                ScanState::Text
            }
            (ScanState::Text, CharacterClass::TagOpen) => return Some(key),
            (ScanState::Text, CharacterClass::Other) => ScanState::Text,
        };
        later = key;
    }
    Some(later)
}

/// Whether the characters before a `>` (newest first) open a tag with a non-empty body.
fn closes_tag<K>(before: impl Iterator<Item = (K, char)>) -> bool {
    let mut body_len = 0;
    for (_, ch) in before {
        match CharacterClass::of(ch) {
            CharacterClass::TagOpen => return body_len > 0,
            CharacterClass::TagClose => return false,
            _ => body_len += 1,
        }
    }
    false
}
