use crate::store::{Channel, NewLesson, Store, StoreError, UserProfile};

fn make_store() -> Store {
    Store::open_in_memory().unwrap()
}

fn sample_lesson(faculty_id: i64, code: &str, title: &str, topic: Option<&str>) -> NewLesson {
    NewLesson {
        faculty_id,
        topic: topic.map(str::to_owned),
        code: code.to_owned(),
        title: title.to_owned(),
        file_id: String::from("BQACAgIAAxkBAAIBOWQ-sample-file-id-0123456789abcdef"),
        file_name: Some(String::from("lecture.pdf")),
        file_size: 1024,
    }
}

#[test]
fn faculty_names_are_unique() {
    let store = make_store();
    store.add_faculty("Tarix").unwrap();
    assert_eq!(
        store.add_faculty("Tarix"),
        Err(StoreError::DuplicateFacultyName(String::from("Tarix"))),
    );
}

#[test]
fn seeding_only_creates_missing_faculties() {
    let store = make_store();
    let names = &["Tarix", "Psixologiya"];
    assert_eq!(store.seed_faculties(names).unwrap(), 2);
    assert_eq!(store.seed_faculties(names).unwrap(), 0);

    let listed: Vec<String> = store
        .all_faculties()
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(listed, vec!["Psixologiya", "Tarix"]);
}

#[test]
fn added_lesson_keeps_every_field() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", Some("Umumiy")))
        .unwrap();

    let lesson = store.lesson_by_code("TX101").unwrap().unwrap();
    assert_eq!(lesson.faculty_id, faculty.id);
    assert_eq!(lesson.code, "TX101");
    assert_eq!(lesson.title, "Kirish");
    assert_eq!(
        lesson.file_id,
        "BQACAgIAAxkBAAIBOWQ-sample-file-id-0123456789abcdef",
    );
    assert_eq!(lesson.file_name.as_deref(), Some("lecture.pdf"));
    assert_eq!(lesson.file_size, 1024);
    assert_eq!(lesson.downloads, 0);
    assert!(lesson.topic_id.is_some());
}

#[test]
fn lesson_codes_are_unique() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", None))
        .unwrap();
    assert_eq!(
        store.add_lesson(&sample_lesson(faculty.id, "TX101", "Boshqa dars", None)),
        Err(StoreError::DuplicateLessonCode(String::from("TX101"))),
    );
}

#[test]
fn lesson_for_unknown_faculty_is_rejected() {
    let store = make_store();
    assert_eq!(
        store.add_lesson(&sample_lesson(999, "TX101", "Kirish", None)),
        Err(StoreError::NoSuchFaculty(999)),
    );
}

#[test]
fn topics_are_created_implicitly_and_scoped_per_faculty() {
    let store = make_store();
    let tarix = store.add_faculty("Tarix").unwrap();
    let iqtisod = store.add_faculty("Iqtisodiyot").unwrap();

    store
        .add_lesson(&sample_lesson(tarix.id, "TX101", "Kirish", Some("Umumiy")))
        .unwrap();
    store
        .add_lesson(&sample_lesson(tarix.id, "TX102", "Davomi", Some("Umumiy")))
        .unwrap();
    store
        .add_lesson(&sample_lesson(iqtisod.id, "IQ101", "Kirish", Some("Umumiy")))
        .unwrap();

    // The shared topic name still separates lessons by faculty.
    assert_eq!(store.topic_lessons(tarix.id, Some("Umumiy")).unwrap().len(), 2);
    assert_eq!(
        store.topic_lessons(iqtisod.id, Some("Umumiy")).unwrap().len(),
        1,
    );

    let first = store.lesson_by_code("TX101").unwrap().unwrap();
    let second = store.lesson_by_code("TX102").unwrap().unwrap();
    assert_eq!(first.topic_id, second.topic_id);
}

#[test]
fn uncategorized_lessons_have_no_topic() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", None))
        .unwrap();

    let listing = store.faculty_lessons(faculty.id).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].topic, None);
    assert_eq!(store.topic_lessons(faculty.id, None).unwrap().len(), 1);
}

#[test]
fn deleting_a_faculty_cascades_to_its_lessons() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", Some("Umumiy")))
        .unwrap();

    store.delete_faculty(faculty.id).unwrap();
    assert_eq!(store.lesson_by_code("TX101").unwrap(), None);
    assert!(store.topic_lessons(faculty.id, Some("Umumiy")).unwrap().is_empty());
    assert_eq!(store.delete_faculty(faculty.id), Err(StoreError::NoSuchFaculty(faculty.id)));
}

#[test]
fn lesson_deletion_requires_an_existing_code() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", None))
        .unwrap();

    store.delete_lesson("TX101").unwrap();
    assert_eq!(
        store.delete_lesson("TX101"),
        Err(StoreError::NoSuchLesson(String::from("TX101"))),
    );
}

#[test]
fn download_counters_move_one_by_one() {
    let store = make_store();
    let faculty = store.add_faculty("Tarix").unwrap();
    store
        .add_lesson(&sample_lesson(faculty.id, "TX101", "Kirish", None))
        .unwrap();
    store
        .register_user(&UserProfile {
            telegram_id: 77,
            username: None,
            first_name: Some(String::from("Aziz")),
            last_name: None,
        })
        .unwrap();

    store.bump_lesson_downloads("TX101").unwrap();
    store.increment_user_downloads(77).unwrap();

    assert_eq!(store.lesson_by_code("TX101").unwrap().unwrap().downloads, 1);
    assert_eq!(
        store.user_by_telegram_id(77).unwrap().unwrap().total_downloads,
        1,
    );
    assert_eq!(
        store.bump_lesson_downloads("NOPE"),
        Err(StoreError::NoSuchLesson(String::from("NOPE"))),
    );
}

#[test]
fn registration_creates_once_then_refreshes() {
    let store = make_store();
    let mut profile = UserProfile {
        telegram_id: 42,
        username: Some(String::from("aziz")),
        first_name: Some(String::from("Aziz")),
        last_name: None,
    };
    assert!(store.register_user(&profile).unwrap());

    profile.username = Some(String::from("aziz_new"));
    assert!(!store.register_user(&profile).unwrap());

    let user = store.user_by_telegram_id(42).unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("aziz_new"));
    assert!(!user.is_blocked);
    assert!(!user.is_admin);
    assert!(user.last_active.is_some());
}

#[test]
fn stats_count_today() {
    let store = make_store();
    for id in 1..=3 {
        store
            .register_user(&UserProfile {
                telegram_id: id,
                username: None,
                first_name: None,
                last_name: None,
            })
            .unwrap();
    }

    let stats = store.user_stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.new_today, 3);
    assert_eq!(stats.active_today, 3);
}

#[test]
fn admin_flag_lifecycle() {
    let store = make_store();
    assert_eq!(store.grant_admin(42), Err(StoreError::NoSuchUser(42)));

    store
        .register_user(&UserProfile {
            telegram_id: 42,
            username: None,
            first_name: None,
            last_name: None,
        })
        .unwrap();
    assert!(!store.is_admin(42).unwrap());

    store.grant_admin(42).unwrap();
    assert!(store.is_admin(42).unwrap());
    assert_eq!(store.list_admins().unwrap().len(), 1);

    store.revoke_admin(42).unwrap();
    assert!(!store.is_admin(42).unwrap());
}

#[test]
fn faculty_selection_is_persisted() {
    let store = make_store();
    store
        .register_user(&UserProfile {
            telegram_id: 42,
            username: None,
            first_name: None,
            last_name: None,
        })
        .unwrap();
    assert_eq!(store.user_faculty(42).unwrap(), None);

    store.set_faculty(42, "Tarix").unwrap();
    assert_eq!(store.user_faculty(42).unwrap().as_deref(), Some("Tarix"));
}

#[test]
fn channels_upsert_and_delete() {
    let store = make_store();
    let channel = Channel {
        channel_id: -1001,
        title: String::from("Yangiliklar"),
        invite_link: String::from("https://t.me/yangiliklar"),
    };
    store.upsert_channel(&channel).unwrap();
    assert_eq!(store.all_channels().unwrap(), vec![channel.clone()]);

    let renamed = Channel {
        title: String::from("Asosiy kanal"),
        ..channel
    };
    store.upsert_channel(&renamed).unwrap();
    let listed = store.all_channels().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Asosiy kanal");

    store.delete_channel(-1001).unwrap();
    assert_eq!(
        store.delete_channel(-1001),
        Err(StoreError::NoSuchChannel(-1001)),
    );
}
