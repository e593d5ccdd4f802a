//! `@font-face` extraction.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};
use unifont_core::{FaceDescriptor, FontSource, FontWeight, format_priority};

type Failure<'i> = ParseError<'i, ()>;

/// One decoded component of a declaration value.
#[derive(Debug, Clone, PartialEq)]
enum CssValue {
    Text(String),
    Number(f64),
    Source(FontSource),
}

impl CssValue {
    fn as_text(&self) -> Option<String> {
        match self {
            CssValue::Text(text) => Some(text.clone()),
            CssValue::Number(n) => Some(format_number(*n)),
            CssValue::Source(_) => None,
        }
    }
}

#[derive(Debug)]
struct Declaration {
    /// Lowercased property name.
    name: String,
    values: Vec<CssValue>,
    /// Value text between the colon and the terminating semicolon.
    raw: String,
}

/// Extract every `@font-face` rule in `css` as a [`FaceDescriptor`].
///
/// With `family_filter`, only rules whose `font-family` names that family
/// (case-insensitively) are kept. Rules without a usable `src` are dropped.
/// Rules identical in every field but `src` are merged, and each merged
/// source list is ordered by format priority. Unparseable input yields an
/// empty list.
pub fn extract_faces(css: &str, family_filter: Option<&str>) -> Vec<FaceDescriptor> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut blocks = Vec::new();
    collect_font_faces(&mut parser, &mut blocks);

    let faces = blocks
        .into_iter()
        .filter(|declarations| family_filter.is_none_or(|family| matches_family(declarations, family)))
        .filter_map(build_face)
        .collect();
    merge_faces(faces)
}

/// Walk every block in the stylesheet, collecting the declarations of each
/// `@font-face` body.
fn collect_font_faces<'i, 't>(parser: &mut Parser<'i, 't>, out: &mut Vec<Vec<Declaration>>) {
    let mut pending_font_face = false;
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::AtKeyword(name) => pending_font_face = name.eq_ignore_ascii_case("font-face"),
            Token::Semicolon => pending_font_face = false,
            Token::CurlyBracketBlock => {
                let is_font_face = std::mem::take(&mut pending_font_face);
                let _ = parser.parse_nested_block(|block| {
                    if is_font_face {
                        let declarations = parse_declarations(block);
                        log::trace!("@font-face with {} declarations", declarations.len());
                        out.push(declarations);
                    } else {
                        collect_font_faces(block, out);
                    }
                    Ok::<_, Failure<'i>>(())
                });
            }
            _ => {}
        }
    }
}

fn parse_declarations<'i, 't>(parser: &mut Parser<'i, 't>) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    while !parser.is_exhausted() {
        let parsed = parser.parse_until_after(Delimiter::Semicolon, |p| {
            let name = p.expect_ident()?.to_ascii_lowercase();
            p.expect_colon()?;
            let start = p.position();
            let values = decode_values(p);
            let raw = strip_important(p.slice_from(start));
            Ok::<_, Failure<'i>>(Declaration { name, values, raw })
        });
        if let Ok(declaration) = parsed {
            declarations.push(declaration);
        }
    }
    declarations
}

/// Decode a declaration value token by token.
///
/// Identifiers and dimensions accumulate into a space-joined word until a
/// comma, so `oblique 10deg 20deg` stays one value.
fn decode_values<'i, 't>(parser: &mut Parser<'i, 't>) -> Vec<CssValue> {
    let mut values = Vec::new();
    let mut buffer = String::new();
    let mut important = false;

    while let Ok(token) = parser.next() {
        let token = token.clone();
        if important {
            continue;
        }
        match token {
            Token::QuotedString(text) => values.push(CssValue::Text(text.to_string())),
            Token::Number {
                value, int_value, ..
            } => values.push(CssValue::Number(token_number(value, int_value))),
            Token::Ident(word) => push_word(&mut buffer, &word),
            Token::Dimension {
                value,
                int_value,
                unit,
                ..
            } => push_word(&mut buffer, &format!("{}{unit}", token_number_text(value, int_value))),
            Token::Percentage {
                unit_value,
                int_value,
                ..
            } => push_word(
                &mut buffer,
                &format!("{}%", token_number_text(unit_value * 100.0, int_value)),
            ),
            Token::Comma => flush(&mut buffer, &mut values),
            Token::UnquotedUrl(url) => values.push(CssValue::Source(FontSource::remote(url.to_string()))),
            Token::Function(name) => {
                let name = name.to_ascii_lowercase();
                let argument = parser
                    .parse_nested_block(|p| Ok::<_, Failure<'i>>(function_argument(p)))
                    .ok()
                    .flatten();
                apply_function(&name, argument, &mut values);
            }
            Token::Delim('!') => important = true,
            _ => {}
        }
    }

    flush(&mut buffer, &mut values);
    values
}

/// First string argument of a function, or its identifiers joined by spaces.
fn function_argument<'i, 't>(parser: &mut Parser<'i, 't>) -> Option<String> {
    let mut quoted = None;
    let mut words: Vec<String> = Vec::new();
    while let Ok(token) = parser.next() {
        match token {
            Token::QuotedString(text) if quoted.is_none() => quoted = Some(text.to_string()),
            Token::Ident(word) => words.push(word.to_string()),
            _ => {}
        }
    }
    quoted.or_else(|| (!words.is_empty()).then(|| words.join(" ")))
}

fn apply_function(name: &str, argument: Option<String>, values: &mut Vec<CssValue>) {
    let Some(argument) = argument else {
        return;
    };
    match name {
        "url" => values.push(CssValue::Source(FontSource::remote(argument))),
        "local" => values.push(CssValue::Source(FontSource::local(argument))),
        "format" | "tech" => {
            if let Some(CssValue::Source(FontSource::Remote(remote))) = values.last_mut() {
                if name == "format" {
                    remote.format = Some(argument);
                } else {
                    remote.tech = Some(argument);
                }
            }
        }
        _ => {}
    }
}

fn push_word(buffer: &mut String, word: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(word);
}

fn flush(buffer: &mut String, values: &mut Vec<CssValue>) {
    if !buffer.is_empty() {
        values.push(CssValue::Text(std::mem::take(buffer)));
    }
}

fn token_number(value: f32, int_value: Option<i32>) -> f64 {
    match int_value {
        Some(int) => f64::from(int),
        // Going through the shortest f32 text avoids `0.1` becoming `0.10000000149`.
        None => value.to_string().parse().unwrap_or(f64::from(value)),
    }
}

fn token_number_text(value: f32, int_value: Option<i32>) -> String {
    match int_value {
        Some(int) => int.to_string(),
        None => value.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn strip_important(raw: &str) -> String {
    let raw = raw.trim();
    match raw.rfind('!') {
        Some(i) if raw[i + 1..].trim().eq_ignore_ascii_case("important") => raw[..i].trim_end().to_string(),
        _ => raw.to_string(),
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Comma-split, unquoted text of a value the tokenizer could not decode.
fn raw_values(raw: &str) -> Vec<CssValue> {
    raw.split(',')
        .map(|part| unquote(part.trim()))
        .filter(|part| !part.is_empty())
        .map(|part| CssValue::Text(part.to_string()))
        .collect()
}

fn values_or_raw(declaration: &Declaration) -> Vec<CssValue> {
    if declaration.values.is_empty() {
        raw_values(&declaration.raw)
    } else {
        declaration.values.clone()
    }
}

fn matches_family(declarations: &[Declaration], family: &str) -> bool {
    let family = family.to_lowercase();
    declarations
        .iter()
        .filter(|d| d.name == "font-family")
        .any(|d| {
            values_or_raw(d)
                .iter()
                .filter_map(CssValue::as_text)
                .any(|value| value.to_lowercase() == family)
        })
}

fn joined_text(values: &[CssValue]) -> Option<String> {
    let parts: Vec<String> = values.iter().filter_map(CssValue::as_text).collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn weight_value(values: &[CssValue]) -> Option<FontWeight> {
    match values {
        [] => None,
        [CssValue::Number(n)] => Some(FontWeight::Number(*n)),
        [CssValue::Number(min), CssValue::Number(max)] => Some(FontWeight::Range(*min, *max)),
        _ => joined_text(values).map(FontWeight::Text),
    }
}

fn unicode_ranges(raw: &str) -> Option<Vec<String>> {
    let ranges: Vec<String> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|range| !range.is_empty())
        .map(str::to_string)
        .collect();
    (!ranges.is_empty()).then_some(ranges)
}

fn non_empty(raw: String) -> Option<String> {
    (!raw.is_empty()).then_some(raw)
}

fn build_face(declarations: Vec<Declaration>) -> Option<FaceDescriptor> {
    let mut face = FaceDescriptor::default();
    let mut sources = Vec::new();

    for declaration in declarations {
        let values = values_or_raw(&declaration);
        match declaration.name.as_str() {
            "src" => {
                sources = values
                    .into_iter()
                    .filter_map(|value| match value {
                        CssValue::Source(source) => Some(source),
                        _ => None,
                    })
                    .collect();
            }
            "font-display" => face.display = joined_text(&values),
            "font-weight" => face.weight = weight_value(&values),
            "font-stretch" => face.stretch = joined_text(&values),
            "font-style" => face.style = joined_text(&values),
            "font-feature-settings" => face.feature_settings = non_empty(declaration.raw),
            "font-variation-settings" | "font-variations-settings" => {
                face.variation_settings = non_empty(declaration.raw)
            }
            "unicode-range" => face.unicode_range = unicode_ranges(&declaration.raw),
            _ => {}
        }
    }

    if sources.is_empty() {
        log::trace!("dropping @font-face without sources");
        return None;
    }
    face.src = sources;
    Some(face)
}

fn merge_faces(faces: Vec<FaceDescriptor>) -> Vec<FaceDescriptor> {
    let mut merged: Vec<(String, FaceDescriptor)> = Vec::new();
    for face in faces {
        let key = face.merge_key();
        match merged
            .iter_mut()
            .find(|(existing_key, existing)| *existing_key == key && existing.meta == face.meta)
        {
            Some((_, existing)) => existing.extend_sources(face.src),
            None => merged.push((key, face)),
        }
    }

    merged
        .into_iter()
        .map(|(_, mut face)| {
            face.src.sort_by_key(|source| format_priority(source.format()));
            face
        })
        .collect()
}
