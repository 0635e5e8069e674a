use crate::catalog::{
    group_by_topic, natural_cmp, ordinal_from_label, truncate_chars, BrowseSession, TopicChoice,
    PAGE_SIZE,
};
use crate::store::{Faculty, FacultyLesson, LessonSummary};
use std::cmp::Ordering;

fn lesson(title: &str) -> LessonSummary {
    LessonSummary {
        code: format!("C-{}", title),
        title: title.to_owned(),
        downloads: 0,
    }
}

fn faculty() -> Faculty {
    Faculty {
        id: 1,
        name: String::from("Tarix"),
    }
}

fn session_of(titles: &[&str]) -> BrowseSession {
    BrowseSession::new(
        faculty(),
        TopicChoice::Named(String::from("Umumiy")),
        titles.iter().map(|t| lesson(t)).collect(),
    )
}

#[test]
fn natural_sort_is_numeric_aware() {
    let session = session_of(&["Lesson 10", "Lesson 2", "Lesson 1"]);
    let titles: Vec<&str> = (1..=3)
        .map(|ordinal| session.by_ordinal(ordinal).unwrap().title.as_str())
        .collect();
    assert_eq!(titles, vec!["Lesson 1", "Lesson 2", "Lesson 10"]);
}

#[test]
fn natural_cmp_ignores_case_and_leading_zeros() {
    assert_eq!(natural_cmp("lesson 2", "Lesson 10"), Ordering::Less);
    assert_eq!(natural_cmp("Dars 007", "dars 7"), Ordering::Equal);
    assert_eq!(natural_cmp("Amaliyot", "amaliyot 2"), Ordering::Less);
}

#[test]
fn pages_cover_the_list_without_overlap() {
    let titles: Vec<String> = (1..=25).map(|i| format!("Dars {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let mut session = session_of(&refs);

    assert_eq!(session.page_count(), 3);
    assert_eq!(session.len(), 25);

    // Page 1: items 1-10, no way back.
    assert!(!session.has_prev());
    assert!(session.has_next());
    assert_eq!(session.page_items().len(), PAGE_SIZE);
    assert_eq!(session.page_items()[0].title, "Dars 1");
    assert_eq!(session.page_items()[9].title, "Dars 10");
    assert_eq!(session.first_ordinal(), 1);

    // Page 3: items 21-25, no way forward.
    assert!(session.next_page());
    assert!(session.next_page());
    assert!(!session.next_page());
    assert_eq!(session.page_index(), 2);
    assert!(session.has_prev());
    assert!(!session.has_next());
    assert_eq!(session.page_items().len(), 5);
    assert_eq!(session.page_items()[0].title, "Dars 21");
    assert_eq!(session.page_items()[4].title, "Dars 25");
    assert_eq!(session.first_ordinal(), 21);

    assert!(session.prev_page());
    assert_eq!(session.page_index(), 1);
}

#[test]
fn ordinals_span_the_whole_list() {
    let titles: Vec<String> = (1..=25).map(|i| format!("Dars {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let session = session_of(&refs);

    assert_eq!(session.by_ordinal(15).unwrap().title, "Dars 15");
    assert_eq!(session.by_ordinal(25).unwrap().title, "Dars 25");
    assert_eq!(session.by_ordinal(0), None);
    assert_eq!(session.by_ordinal(26), None);
}

#[test]
fn rendering_the_same_page_twice_is_identical() {
    let session = session_of(&["B", "A", "C"]);
    let again = session_of(&["B", "A", "C"]);
    assert_eq!(session, again);
    assert_eq!(session.page_items(), again.page_items());
}

#[test]
fn topic_groups_put_the_uncategorized_bucket_last() {
    let listing = vec![
        FacultyLesson {
            topic: Some(String::from("Mavzu 10")),
            lesson: lesson("A"),
        },
        FacultyLesson {
            topic: None,
            lesson: lesson("B"),
        },
        FacultyLesson {
            topic: Some(String::from("Mavzu 2")),
            lesson: lesson("C"),
        },
        FacultyLesson {
            topic: Some(String::from("Mavzu 2")),
            lesson: lesson("D"),
        },
    ];
    let groups = group_by_topic(&listing);
    assert_eq!(
        groups,
        vec![
            (TopicChoice::Named(String::from("Mavzu 2")), 2),
            (TopicChoice::Named(String::from("Mavzu 10")), 1),
            (TopicChoice::Uncategorized, 1),
        ],
    );
}

#[test]
fn button_labels_resolve_back_to_ordinals() {
    assert_eq!(ordinal_from_label("12. Kirish darsi"), Some(12));
    assert_eq!(ordinal_from_label("3. Dars 2.1 davomi"), Some(3));
    assert_eq!(ordinal_from_label("Kirish darsi"), None);
    assert_eq!(ordinal_from_label("x. Kirish"), None);
}

#[test]
fn truncation_respects_character_boundaries() {
    assert_eq!(truncate_chars("Ma'ruza", 100), "Ma'ruza");
    assert_eq!(truncate_chars("Ўзбекча дарслик", 8), "Ўзбекча ");
    assert_eq!(truncate_chars("abc", 0), "");
}
