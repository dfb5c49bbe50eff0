//! # Lexer - Tokenizing Markup Source
//!
//! The first stage of parsing: breaking source text into tokens using the
//! [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped,
//! so concatenating the token texts gives back the original input:
//!
//! ```
//! use blockdoc_syntax::lexer::lex;
//!
//! let input = "<p class=\"x\">Hello <b>world</b></p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tags are lexed whole (`<p class="x">` is one `StartTag` token). The lexer
//! does not know which elements are void or how tags nest - that is the
//! parser's job. A `<` that does not start a well-formed tag becomes text,
//! which is what makes half-typed markup like `a < b` survive a round trip.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name ...>` or `<name .../>`; quoted attribute values may contain `>`
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^<>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// `</name>`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>")]
    EndTag,

    /// `<!doctype ...>` or `<!-- ... -->`
    #[regex(r"<![^>]*>")]
    Declaration,

    /// A `<` that starts nothing recognisable
    #[token("<")]
    StrayLt,

    /// Character data between tags
    #[regex(r"[^<]+")]
    Text,
}

/// A lexed token with its kind, text slice and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: std::ops::Range<usize>,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let kind = match result {
            Ok(kind) => kind,
            // Unrecognised input is character data
            Err(()) => TokenKind::Text,
        };
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span: lexer.span(),
        });
    }

    tokens
}
