use crate::callback_query::{parse_callback_query, Query, QueryParseError};
use crate::state::DialogState;
use crate::ui;

#[test]
fn queries_round_trip_through_the_wire_format() {
    let queries = [
        Query::SelectFaculty { id: 7 },
        Query::FacultyBack,
        Query::CheckSubscription,
        Query::NoAction,
        Query::AddCourseFaculty { id: 3 },
        Query::DeleteFacultyPick { id: 12 },
        Query::DeleteFacultyConfirm { id: 12 },
        Query::ChannelAdd,
        Query::ChannelDelete,
    ];
    for query in queries {
        let encoded = query.to_string();
        assert_eq!(parse_callback_query(&encoded), Ok(query), "{}", encoded);
    }
}

#[test]
fn malformed_queries_are_rejected() {
    assert_eq!(
        parse_callback_query("???"),
        Err(QueryParseError::InvalidSyntax),
    );
    assert_eq!(
        parse_callback_query("bogus"),
        Err(QueryParseError::InvalidCommand {
            command: String::from("bogus"),
        }),
    );
    assert_eq!(
        parse_callback_query("faculty@x"),
        Err(QueryParseError::InvalidPayload {
            command: String::from("faculty"),
            payload: Some(String::from("x")),
        }),
    );
    assert_eq!(
        parse_callback_query("faculty-back@1"),
        Err(QueryParseError::InvalidPayload {
            command: String::from("faculty-back"),
            payload: Some(String::from("1")),
        }),
    );
    assert_eq!(
        parse_callback_query("faculty"),
        Err(QueryParseError::InvalidPayload {
            command: String::from("faculty"),
            payload: None,
        }),
    );
}

#[test]
fn cancel_inputs_are_recognized_everywhere() {
    assert!(ui::is_cancel_input("🏠 Asosiy menyu"));
    assert!(ui::is_cancel_input("❌ Bekor qilish"));
    assert!(ui::is_cancel_input("/cancel"));
    assert!(ui::is_cancel_input("/CANCEL"));
    assert!(!ui::is_cancel_input("/start"));
}

#[test]
fn only_guided_flows_count_as_in_flow() {
    use crate::state::states;
    use crate::store::Faculty;

    assert!(!DialogState::Initial.in_flow());
    assert!(!DialogState::MainMenu.in_flow());
    assert!(!DialogState::TopicSelection(states::TopicSelection {
        faculty: Faculty {
            id: 1,
            name: String::from("Tarix"),
        },
    })
    .in_flow());

    assert!(DialogState::AddLessonFaculty.in_flow());
    assert!(DialogState::DeleteLessonCode.in_flow());
    assert!(DialogState::AddFacultyName.in_flow());
    assert!(DialogState::Broadcast.in_flow());
}
