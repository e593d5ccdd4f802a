use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};

/// A slice of a stylesheet covering one subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetCss {
    /// Text of the comment preceding the rule (`latin`, `cyrillic-ext`, ...).
    pub subset: Option<String>,
    pub css: String,
}

/// Split `css` into one group per `@font-face`, each tagged with the last
/// comment before it. Without any comment the whole input is one untagged
/// group.
pub fn split_css_into_subsets(css: &str) -> Vec<SubsetCss> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let (groups, saw_comment) = collect_groups(&mut parser);

    if !saw_comment {
        return vec![SubsetCss {
            subset: None,
            css: css.to_string(),
        }];
    }
    groups
}

fn collect_groups<'i, 't>(parser: &mut Parser<'i, 't>) -> (Vec<SubsetCss>, bool) {
    let mut groups = Vec::new();
    let mut last_comment: Option<String> = None;
    let mut saw_comment = false;
    let mut font_face_start: Option<SourcePosition> = None;

    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Comment(text) => {
                saw_comment = true;
                last_comment = Some(text.trim().to_string());
            }
            Token::AtKeyword(name) => {
                font_face_start = name.eq_ignore_ascii_case("font-face").then_some(before);
            }
            Token::Semicolon => font_face_start = None,
            Token::CurlyBracketBlock => {
                let inner = parser.parse_nested_block(|block| {
                    Ok::<_, ParseError<'i, ()>>(last_comment_in(block))
                });
                if let Some(start) = font_face_start.take() {
                    groups.push(SubsetCss {
                        subset: last_comment.clone(),
                        css: parser.slice_from(start).to_string(),
                    });
                }
                if let Ok(Some(comment)) = inner {
                    saw_comment = true;
                    last_comment = Some(comment);
                }
            }
            _ => {}
        }
    }

    (groups, saw_comment)
}

fn last_comment_in<'i, 't>(parser: &mut Parser<'i, 't>) -> Option<String> {
    let mut comment = None;
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        if let Token::Comment(text) = token {
            comment = Some(text.trim().to_string());
        }
    }
    comment
}
