mod catalog;
mod format;

const CATALOG_PATH: &'static str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../resources/strings.yml");

/// Compile `resources/strings.yml` into a tree of `Strings*` structs whose
/// methods build `FormattedText` values with precomputed entity offsets.
#[proc_macro]
pub fn make_string_library(_tokens: proc_macro::TokenStream) -> proc_macro::TokenStream {
    crate::catalog::generate_library_from_yaml(CATALOG_PATH).into()
}
