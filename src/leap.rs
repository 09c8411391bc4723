//! Control-transfer contexts
//!
//! The emitter keeps a stack of the constructs it is currently inside so that a
//! `break` or `continue` can find its target location. Entries are acquired
//! through [`with_entry`], which releases them on every exit path and checks
//! that releases happen in acquisition order.

use crate::validate::TransformError;

/// Placeholder for a listing offset, bound once when the emitter marks it.
/// Two locations are the same only if they are the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc(pub(crate) u32);

impl Loc {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchEntry {
    pub first_loc: Loc,
    pub param: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinallyEntry {
    pub first_loc: Loc,
    pub after_loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Function { return_loc: Loc },
    /// `labels` holds every label stacked directly on the loop.
    Loop { break_loc: Loc, continue_loc: Loc, labels: Vec<String> },
    Switch { break_loc: Loc },
    Labeled { break_loc: Loc, label: String },
    Try { first_loc: Loc, catch: Option<CatchEntry>, finally: Option<FinallyEntry> },
    Catch(CatchEntry),
    Finally(FinallyEntry),
}

impl Entry {
    pub fn has_label(&self, name: &str) -> bool {
        match self {
            Entry::Loop { labels, .. } => labels.iter().any(|label| label == name),
            Entry::Labeled { label, .. } => label == name,
            _ => false,
        }
    }

    fn break_loc(&self) -> Option<Loc> {
        match self {
            Entry::Loop { break_loc, .. }
            | Entry::Switch { break_loc }
            | Entry::Labeled { break_loc, .. } => Some(*break_loc),
            _ => None,
        }
    }

    fn continue_loc(&self) -> Option<Loc> {
        match self {
            Entry::Loop { continue_loc, .. } => Some(*continue_loc),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Entry::Function { .. } => "function",
            Entry::Loop { .. } => "loop",
            Entry::Switch { .. } => "switch",
            Entry::Labeled { .. } => "labeled",
            Entry::Try { .. } => "try",
            Entry::Catch(_) => "catch",
            Entry::Finally(_) => "finally",
        }
    }
}

/// Proof of a push; only the matching pop consumes it.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct EntryToken {
    serial: u32,
}

#[derive(Debug)]
pub struct LeapManager {
    stack: Vec<(u32, Entry)>,
    next_serial: u32,
}

impl LeapManager {
    /// A fresh stack holding only the function entry.
    pub fn new(return_loc: Loc) -> Self {
        LeapManager { stack: vec![(0, Entry::Function { return_loc })], next_serial: 1 }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, entry: Entry) -> EntryToken {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.stack.push((serial, entry));
        EntryToken { serial }
    }

    pub fn pop(&mut self, token: EntryToken) -> Result<Entry, TransformError> {
        match self.stack.last() {
            Some((serial, _)) if *serial == token.serial && self.stack.len() > 1 => {
                let (_, entry) = self.stack.pop().ok_or_else(|| TransformError::EntryMismatch {
                    expected: token.serial,
                    found: "empty stack".to_string(),
                })?;
                Ok(entry)
            }
            Some((serial, entry)) => Err(TransformError::EntryMismatch {
                expected: token.serial,
                found: format!("{} entry #{}", entry.kind_name(), serial),
            }),
            None => Err(TransformError::EntryMismatch {
                expected: token.serial,
                found: "empty stack".to_string(),
            }),
        }
    }

    pub fn break_loc(&self, label: Option<&str>) -> Option<Loc> {
        self.find(label, Entry::break_loc)
    }

    pub fn continue_loc(&self, label: Option<&str>) -> Option<Loc> {
        self.find(label, Entry::continue_loc)
    }

    fn find(&self, label: Option<&str>, property: fn(&Entry) -> Option<Loc>) -> Option<Loc> {
        for (_, entry) in self.stack.iter().rev() {
            let Some(loc) = property(entry) else {
                continue;
            };
            match label {
                Some(label) if entry.has_label(label) => return Some(loc),
                Some(_) => {}
                // A labeled statement only answers `break label`.
                None if matches!(entry, Entry::Labeled { .. }) => {}
                None => return Some(loc),
            }
        }
        None
    }
}

/// Anything that owns a [`LeapManager`] can scope entries with [`with_entry`].
pub trait HasLeapManager {
    fn leap_manager(&mut self) -> &mut LeapManager;
}

/// Runs `body` with `entry` on top of the stack. The entry is released whether
/// or not `body` fails; a body error wins over a release error.
pub fn with_entry<C, T, F>(ctx: &mut C, entry: Entry, body: F) -> Result<T, TransformError>
where
    C: HasLeapManager + ?Sized,
    F: FnOnce(&mut C) -> Result<T, TransformError>,
{
    let token = ctx.leap_manager().push(entry);
    let result = body(ctx);
    let popped = ctx.leap_manager().pop(token);
    let value = result?;
    popped?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Holder {
        leaps: LeapManager,
    }

    impl HasLeapManager for Holder {
        fn leap_manager(&mut self) -> &mut LeapManager {
            &mut self.leaps
        }
    }

    #[test]
    fn test_labeled_break_skips_inner_loop() {
        let mut holder = Holder { leaps: LeapManager::new(Loc(0)) };
        let outer = Entry::Labeled { break_loc: Loc(1), label: "outer".to_string() };
        let found = with_entry(&mut holder, outer, |h| {
            let outer_loop = Entry::Loop {
                break_loc: Loc(2),
                continue_loc: Loc(3),
                labels: vec!["outer".to_string()],
            };
            with_entry(h, outer_loop, |h| {
                let inner = Entry::Loop { break_loc: Loc(4), continue_loc: Loc(5), labels: vec![] };
                with_entry(h, inner, |h| {
                    let leaps = &h.leaps;
                    Ok((
                        leaps.break_loc(Some("outer")),
                        leaps.break_loc(None),
                        leaps.continue_loc(Some("outer")),
                        leaps.break_loc(Some("missing")),
                    ))
                })
            })
        })
        .unwrap();
        assert_eq!(found, (Some(Loc(2)), Some(Loc(4)), Some(Loc(3)), None));
        assert_eq!(holder.leaps.depth(), 1);
    }

    #[test]
    fn test_labeled_entry_is_transparent_to_unlabeled_break() {
        let mut leaps = LeapManager::new(Loc(0));
        let token = leaps.push(Entry::Labeled { break_loc: Loc(1), label: "block".to_string() });
        assert_eq!(leaps.break_loc(None), None);
        assert_eq!(leaps.break_loc(Some("block")), Some(Loc(1)));
        assert_eq!(leaps.continue_loc(Some("block")), None);
        leaps.pop(token).unwrap();
    }

    #[test]
    fn test_switch_answers_break_but_not_continue() {
        let mut leaps = LeapManager::new(Loc(0));
        let outer = leaps.push(Entry::Loop { break_loc: Loc(1), continue_loc: Loc(2), labels: vec![] });
        let inner = leaps.push(Entry::Switch { break_loc: Loc(3) });
        assert_eq!(leaps.break_loc(None), Some(Loc(3)));
        assert_eq!(leaps.continue_loc(None), Some(Loc(2)));
        leaps.pop(inner).unwrap();
        leaps.pop(outer).unwrap();
    }

    #[test]
    fn test_stacked_labels_all_reach_the_loop() {
        let mut leaps = LeapManager::new(Loc(0));
        let outer = leaps.push(Entry::Labeled { break_loc: Loc(1), label: "a".to_string() });
        let inner = leaps.push(Entry::Labeled { break_loc: Loc(1), label: "b".to_string() });
        let body = leaps.push(Entry::Loop {
            break_loc: Loc(1),
            continue_loc: Loc(2),
            labels: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(leaps.continue_loc(Some("a")), Some(Loc(2)));
        assert_eq!(leaps.continue_loc(Some("b")), Some(Loc(2)));
        assert_eq!(leaps.break_loc(Some("a")), Some(Loc(1)));
        assert_eq!(leaps.continue_loc(Some("c")), None);
        leaps.pop(body).unwrap();
        leaps.pop(inner).unwrap();
        leaps.pop(outer).unwrap();
    }

    #[test]
    fn test_out_of_order_pop_is_rejected() {
        let mut leaps = LeapManager::new(Loc(0));
        let first = leaps.push(Entry::Switch { break_loc: Loc(1) });
        let second = leaps.push(Entry::Switch { break_loc: Loc(2) });
        let err = leaps.pop(first).unwrap_err();
        assert_eq!(err.code(), crate::validate::INV_ENTRY_MISMATCH);
        leaps.pop(second).unwrap();
    }

    #[test]
    fn test_entry_released_when_body_fails() {
        let mut holder = Holder { leaps: LeapManager::new(Loc(0)) };
        let result: Result<(), _> = with_entry(&mut holder, Entry::Switch { break_loc: Loc(1) }, |_| {
            Err(TransformError::WithStatement { at: 0 })
        });
        assert!(matches!(result, Err(TransformError::WithStatement { .. })));
        assert_eq!(holder.leaps.depth(), 1);
    }
}
