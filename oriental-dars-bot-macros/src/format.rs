use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// A parsed piece of a catalog string.
///
/// The markup language is small: `{}`-style placeholders become method
/// parameters, `@kind(...)` spans become Telegram message entities, and `\`
/// escapes the next character.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Piece {
    Text(String),
    Param(String),
    Markup { kind: MarkupKind, inner: Vec<Piece> },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MarkupKind {
    Bold,
    Italic,
    Underline,
    Code,
    Pre,
}

impl MarkupKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            "code" => Some(Self::Code),
            "pre" => Some(Self::Pre),
            _ => None,
        }
    }

    fn entity_kind_tokens(self) -> TokenStream {
        match self {
            Self::Bold => quote! { Bold },
            Self::Italic => quote! { Italic },
            Self::Underline => quote! { Underline },
            Self::Code => quote! { Code },
            Self::Pre => quote! { Pre { language: None } },
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormatError {
    TrailingInput,
    UnterminatedParam,
    UnterminatedMarkup,
    UnknownMarkup(String),
    EmptyMarkupName,
    DanglingEscape,
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Parse pieces until end of input or an (unconsumed) closing paren.
    fn pieces(&mut self) -> Result<Vec<Piece>, FormatError> {
        let mut pieces = Vec::new();
        loop {
            match self.peek() {
                None | Some(')') => return Ok(pieces),
                Some('{') => pieces.push(self.param()?),
                Some('@') => pieces.push(self.markup()?),
                Some(_) => pieces.push(self.text()?),
            }
        }
    }

    fn param(&mut self) -> Result<Piece, FormatError> {
        assert_eq!(self.bump(), Some('{'));
        let mut spec = String::new();
        loop {
            match self.bump() {
                Some('}') => return Ok(Piece::Param(spec)),
                Some(c) => spec.push(c),
                None => return Err(FormatError::UnterminatedParam),
            }
        }
    }

    fn markup(&mut self) -> Result<Piece, FormatError> {
        assert_eq!(self.bump(), Some('@'));
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                self.bump();
                name.push(c);
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(FormatError::EmptyMarkupName);
        }
        let kind =
            MarkupKind::from_name(&name).ok_or_else(|| FormatError::UnknownMarkup(name))?;
        if self.bump() != Some('(') {
            return Err(FormatError::UnterminatedMarkup);
        }
        let inner = self.pieces()?;
        if self.bump() != Some(')') {
            return Err(FormatError::UnterminatedMarkup);
        }
        Ok(Piece::Markup { kind, inner })
    }

    fn text(&mut self) -> Result<Piece, FormatError> {
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('{' | '@' | ')') => return Ok(Piece::Text(text)),
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(FormatError::DanglingEscape),
                    }
                }
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
    }
}

pub fn parse(source: &str) -> Result<Vec<Piece>, FormatError> {
    let mut cursor = Cursor::new(source);
    let pieces = cursor.pieces()?;
    // A stray `)` at the top level stops `pieces` early.
    if cursor.peek().is_some() {
        return Err(FormatError::TrailingInput);
    }
    Ok(pieces)
}

/// Generate the body of one string accessor. Returns the code and the number
/// of `{}` parameters it expects.
///
/// Entity offsets are measured in UTF-16 code units, which is what the Bot
/// API counts.
pub fn generate(pieces: &[Piece]) -> (TokenStream, usize) {
    let mut num_params = 0;
    let body = emit_pieces(pieces, &mut num_params);
    let code = quote! {
        let mut raw_text = String::new();
        #[allow(unused)]
        let mut utf16_len = 0_usize;
        #[allow(unused_mut)]
        let mut entities = Vec::new();

        #body

        crate::message::FormattedText {
            raw_text,
            entities: Some(entities),
        }
    };
    (code, num_params)
}

fn emit_pieces(pieces: &[Piece], num_params: &mut usize) -> TokenStream {
    let mut stream = TokenStream::new();
    for piece in pieces {
        stream.extend(emit_piece(piece, num_params));
    }
    stream
}

fn emit_piece(piece: &Piece, num_params: &mut usize) -> TokenStream {
    match piece {
        Piece::Text(text) => quote! {
            {
                let chunk: &str = #text;
                raw_text.push_str(chunk);
                utf16_len += chunk.encode_utf16().count();
            }
        },
        Piece::Param(spec) => {
            let full_spec = format!("{{{}}}", spec);
            *num_params += 1;
            let param_ident = format_ident!("param_{}", *num_params);
            quote! {
                {
                    use ::std::fmt::Write;
                    let start = raw_text.len();
                    write!(raw_text, #full_spec, #param_ident).unwrap();
                    utf16_len += raw_text[start..].encode_utf16().count();
                }
            }
        }
        Piece::Markup { kind, inner } => {
            let inner_tokens = emit_pieces(inner, num_params);
            let kind_tokens = kind.entity_kind_tokens();
            quote! {
                {
                    let markup_start = utf16_len;
                    #inner_tokens
                    entities.push(::teloxide::types::MessageEntity {
                        kind: ::teloxide::types::MessageEntityKind::#kind_tokens,
                        offset: markup_start,
                        length: utf16_len - markup_start,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_piece() {
        assert_eq!(
            parse("salom dunyo").unwrap(),
            vec![Piece::Text(String::from("salom dunyo"))],
        );
    }

    #[test]
    fn markup_and_params_parse() {
        let pieces = parse("A @bold(B {}) C {:.2}").unwrap();
        assert_eq!(
            pieces,
            vec![
                Piece::Text(String::from("A ")),
                Piece::Markup {
                    kind: MarkupKind::Bold,
                    inner: vec![
                        Piece::Text(String::from("B ")),
                        Piece::Param(String::new()),
                    ],
                },
                Piece::Text(String::from(" C ")),
                Piece::Param(String::from(":.2")),
            ],
        );
    }

    #[test]
    fn escapes_produce_literals() {
        assert_eq!(
            parse(r"\@user \{x\} \\").unwrap(),
            vec![Piece::Text(String::from(r"@user {x} \"))],
        );
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(
            parse("@blink(x)"),
            Err(FormatError::UnknownMarkup(String::from("blink"))),
        );
        assert_eq!(parse("@bold(x"), Err(FormatError::UnterminatedMarkup));
        assert_eq!(parse("a { b"), Err(FormatError::UnterminatedParam));
        assert_eq!(parse("a ) b"), Err(FormatError::TrailingInput));
    }

    #[test]
    fn param_count_matches_placeholders() {
        let pieces = parse("{} @italic({}) {}").unwrap();
        let (_, num_params) = generate(&pieces);
        assert_eq!(num_params, 3);
    }
}
