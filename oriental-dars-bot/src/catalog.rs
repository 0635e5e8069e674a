//! The catalog browser: topic grouping, natural ordering and the per-user
//! pagination session.

use crate::store::{Faculty, FacultyLesson, LessonSummary};
use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

pub const PAGE_SIZE: usize = 10;

/// Label of the bucket collecting lessons without a topic.
pub const UNCATEGORIZED_LABEL: &str = "Boshqa";

/// Longest title fragment shown on a lesson button.
pub const TITLE_BUTTON_LIMIT: usize = 35;

/// Natural, numeric-aware ordering: digit runs compare as numbers, other
/// runs compare case-insensitively, so "Lesson 2" sorts before "Lesson 10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();
    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let a_run = take_digit_run(&mut a_chars);
                    let b_run = take_digit_run(&mut b_chars);
                    match cmp_digit_runs(&a_run, &b_run) {
                        Ordering::Equal => (),
                        unequal => return unequal,
                    }
                } else {
                    match ca.to_lowercase().cmp(cb.to_lowercase()) {
                        Ordering::Equal => {
                            a_chars.next();
                            b_chars.next();
                        }
                        unequal => return unequal,
                    }
                }
            }
        }
    }
}

fn take_digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            chars.next();
            run.push(c);
        } else {
            break;
        }
    }
    run
}

/// Compare digit runs by value without parsing, so arbitrarily long runs
/// cannot overflow.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A topic menu entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TopicChoice {
    Named(String),
    Uncategorized,
}

impl TopicChoice {
    pub fn label(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Uncategorized => UNCATEGORIZED_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Self {
        if label == UNCATEGORIZED_LABEL {
            Self::Uncategorized
        } else {
            Self::Named(label.to_owned())
        }
    }
}

/// Group a faculty listing into topic menu entries with lesson counts.
/// Named topics come in natural order; the uncategorized bucket goes last.
pub fn group_by_topic(lessons: &[FacultyLesson]) -> Vec<(TopicChoice, usize)> {
    let mut named: Vec<(String, usize)> = Vec::new();
    let mut uncategorized = 0;
    for entry in lessons {
        match entry.topic {
            Some(ref topic) => match named.iter_mut().find(|(name, _)| name == topic) {
                Some((_, count)) => *count += 1,
                None => named.push((topic.clone(), 1)),
            },
            None => uncategorized += 1,
        }
    }
    named.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

    let mut groups: Vec<(TopicChoice, usize)> = named
        .into_iter()
        .map(|(name, count)| (TopicChoice::Named(name), count))
        .collect();
    if uncategorized > 0 {
        groups.push((TopicChoice::Uncategorized, uncategorized));
    }
    groups
}

/// One user's walk through a topic's lessons: the sorted list plus a page
/// cursor. Dropped when the user returns to the topic or faculty level.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BrowseSession {
    pub faculty: Faculty,
    pub topic: TopicChoice,
    lessons: Vec<LessonSummary>,
    page: usize,
}

impl BrowseSession {
    pub fn new(faculty: Faculty, topic: TopicChoice, mut lessons: Vec<LessonSummary>) -> Self {
        lessons.sort_by(|a, b| natural_cmp(&a.title, &b.title));
        Self {
            faculty,
            topic,
            lessons,
            page: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Zero-based page index.
    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        ((self.lessons.len() + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
    }

    pub fn page_items(&self) -> &[LessonSummary] {
        let start = self.page * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.lessons.len());
        &self.lessons[start..end]
    }

    /// Ordinal of the first lesson on the current page, 1-based.
    pub fn first_ordinal(&self) -> usize {
        self.page * PAGE_SIZE + 1
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    pub fn prev_page(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Look a lesson up by its 1-based ordinal in the whole sorted list, not
    /// just the current page.
    pub fn by_ordinal(&self, ordinal: usize) -> Option<&LessonSummary> {
        if ordinal == 0 {
            return None;
        }
        self.lessons.get(ordinal - 1)
    }

}

/// Recover the ordinal from a `"12. Title"`-style button label.
pub fn ordinal_from_label(label: &str) -> Option<usize> {
    let (number, _) = label.split_once('.')?;
    number.trim().parse().ok()
}

/// The longest prefix of `s` holding at most `max` characters, never
/// splitting a multi-byte character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}
