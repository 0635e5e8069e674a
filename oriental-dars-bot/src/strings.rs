use oriental_dars_bot_macros::make_string_library;

// Generates the `Strings*` struct tree from `resources/strings.yml`.
make_string_library!();

/// The compiled user-facing string catalog.
pub static STRINGS: Strings = Strings::new();
