use lazy_static::lazy_static;
use regex::Regex;
use std::convert::TryFrom;
use std::error::Error;
use std::fmt::Display;

/// A parsed inline-keyboard callback. The wire format is
/// `command` or `command@payload`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Query {
    /// A user picks their faculty.
    SelectFaculty { id: i64 },
    /// Back to the faculty menu.
    FacultyBack,
    /// Manual subscription recheck from the join prompt.
    CheckSubscription,
    /// A button that deliberately does nothing (e.g. a broken invite link).
    NoAction,
    /// Add-lesson flow: the admin picks the faculty.
    AddCourseFaculty { id: i64 },
    /// The admin picks a faculty to delete.
    DeleteFacultyPick { id: i64 },
    /// The admin confirms the faculty deletion.
    DeleteFacultyConfirm { id: i64 },
    /// Open the add-channel flow.
    ChannelAdd,
    /// Open the delete-channel flow.
    ChannelDelete,
}

pub(crate) mod cmd {
    pub const SELECT_FACULTY: &'static str = "faculty";
    pub const FACULTY_BACK: &'static str = "faculty-back";
    pub const CHECK_SUBSCRIPTION: &'static str = "check-sub";
    pub const NO_ACTION: &'static str = "no-action";
    pub const ADD_COURSE_FACULTY: &'static str = "addfak";
    pub const DELETE_FACULTY_PICK: &'static str = "del-fakultet";
    pub const DELETE_FACULTY_CONFIRM: &'static str = "fakultetdel";
    pub const CHANNEL_ADD: &'static str = "chan-add";
    pub const CHANNEL_DELETE: &'static str = "chan-del";
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectFaculty { id } => write!(f, "{}@{}", cmd::SELECT_FACULTY, id),
            Self::FacultyBack => write!(f, "{}", cmd::FACULTY_BACK),
            Self::CheckSubscription => write!(f, "{}", cmd::CHECK_SUBSCRIPTION),
            Self::NoAction => write!(f, "{}", cmd::NO_ACTION),
            Self::AddCourseFaculty { id } => write!(f, "{}@{}", cmd::ADD_COURSE_FACULTY, id),
            Self::DeleteFacultyPick { id } => write!(f, "{}@{}", cmd::DELETE_FACULTY_PICK, id),
            Self::DeleteFacultyConfirm { id } => {
                write!(f, "{}@{}", cmd::DELETE_FACULTY_CONFIRM, id)
            }
            Self::ChannelAdd => write!(f, "{}", cmd::CHANNEL_ADD),
            Self::ChannelDelete => write!(f, "{}", cmd::CHANNEL_DELETE),
        }
    }
}

// Needed for seamless teloxide interoperation.
impl From<Query> for String {
    fn from(q: Query) -> Self {
        q.to_string()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct RawQuery<'a> {
    pub command: &'a str,
    pub payload: Option<&'a str>,
}

impl TryFrom<RawQuery<'_>> for Query {
    type Error = QueryParseError;

    fn try_from(value: RawQuery<'_>) -> Result<Self, Self::Error> {
        let err_fn = || QueryParseError::InvalidPayload {
            command: value.command.to_owned(),
            payload: value.payload.map(str::to_owned),
        };
        let parse_id = |payload: Option<&str>| -> Result<i64, QueryParseError> {
            payload
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(err_fn)
        };

        let (query, payload_must_be_none) = match value.command {
            cmd::SELECT_FACULTY => (
                Query::SelectFaculty {
                    id: parse_id(value.payload)?,
                },
                false,
            ),
            cmd::FACULTY_BACK => (Query::FacultyBack, true),
            cmd::CHECK_SUBSCRIPTION => (Query::CheckSubscription, true),
            cmd::NO_ACTION => (Query::NoAction, true),
            cmd::ADD_COURSE_FACULTY => (
                Query::AddCourseFaculty {
                    id: parse_id(value.payload)?,
                },
                false,
            ),
            cmd::DELETE_FACULTY_PICK => (
                Query::DeleteFacultyPick {
                    id: parse_id(value.payload)?,
                },
                false,
            ),
            cmd::DELETE_FACULTY_CONFIRM => (
                Query::DeleteFacultyConfirm {
                    id: parse_id(value.payload)?,
                },
                false,
            ),
            cmd::CHANNEL_ADD => (Query::ChannelAdd, true),
            cmd::CHANNEL_DELETE => (Query::ChannelDelete, true),
            _ => {
                return Err(QueryParseError::InvalidCommand {
                    command: value.command.to_owned(),
                })
            }
        };

        if payload_must_be_none && value.payload.is_some() {
            return Err(err_fn());
        }

        Ok(query)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum QueryParseError {
    InvalidSyntax,
    InvalidCommand {
        command: String,
    },
    InvalidPayload {
        command: String,
        payload: Option<String>,
    },
}

impl Display for QueryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSyntax => write!(f, "Invalid callback query syntax"),
            Self::InvalidCommand { command } => {
                write!(f, "Invalid callback query command `{}`", command)
            }
            Self::InvalidPayload { command, payload } => write!(
                f,
                "Invalid callback query payload `{:?}` for command `{}`",
                payload, command,
            ),
        }
    }
}

impl Error for QueryParseError {}

pub fn parse_callback_query(query: &str) -> Result<Query, QueryParseError> {
    lazy_static! {
        static ref REGEX: Regex =
            Regex::new(r"^(?P<command>[a-zA-Z0-9_-]+)(?:@(?P<payload>.*))?$").unwrap();
    }
    let captures = REGEX.captures(query).ok_or(QueryParseError::InvalidSyntax)?;
    let command = captures.name("command").unwrap().as_str();
    let payload = captures.name("payload").map(|m| m.as_str());
    RawQuery { command, payload }.try_into()
}
