//! Lexeme stream → object stream.
//!
//! The parser assembles `{ … }` into procedure arrays and hands everything
//! else over as objects; it never evaluates. `[` and `<<` become marks, `]`
//! and `>>` become the executable names whose operators perform the actual
//! construction when reached by the VM.

use crate::{
    dictionary::DictStack,
    eexec,
    error::{PostScriptError, PsResult},
    lexer::{Lexeme, LexemeKind, Lexer},
    name::Name,
    object::{ArrayRef, Object, StringRef},
};

const BACKSPACE: u8 = b'\x08';
const FORM_FEED: u8 = b'\x0C';

#[derive(Debug)]
pub struct Parser {
    pub lexer: Lexer,
}

impl Parser {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self {
            lexer: Lexer::new(buffer),
        }
    }

    /// The next object from the stream, or None at end of input.
    /// `min_depth` is the lexer-source barrier for nested streams.
    pub fn next_object(
        &mut self,
        dicts: &DictStack,
        min_depth: usize,
    ) -> PsResult<Option<Object>> {
        loop {
            let lexeme = self.lexer.next_lexeme(min_depth);

            match lexeme.kind {
                LexemeKind::Eof => return Ok(None),
                LexemeKind::Comment | LexemeKind::DscComment => continue,
                LexemeKind::EexecSwitch => {
                    self.lexer.push_encrypted(&lexeme.text)?;
                    continue;
                }
                LexemeKind::LBrace => {
                    let body = self.parse_procedure(dicts, min_depth)?;
                    return Ok(Some(Object::procedure(body)));
                }
                LexemeKind::RBrace => anyhow::bail!(PostScriptError::SyntaxError),
                _ => return Ok(Some(self.object_from_lexeme(lexeme, dicts)?)),
            }
        }
    }

    /// Recursively consume objects until the matching `}`
    fn parse_procedure(&mut self, dicts: &DictStack, min_depth: usize) -> PsResult<ArrayRef> {
        let mut body = Vec::new();

        loop {
            let lexeme = self.lexer.next_lexeme(min_depth);

            match lexeme.kind {
                LexemeKind::RBrace => break,
                LexemeKind::Eof => anyhow::bail!(PostScriptError::SyntaxError),
                LexemeKind::Comment | LexemeKind::DscComment => continue,
                LexemeKind::EexecSwitch => {
                    self.lexer.push_encrypted(&lexeme.text)?;
                    continue;
                }
                LexemeKind::LBrace => {
                    let nested = self.parse_procedure(dicts, min_depth)?;
                    body.push(Object::procedure(nested));
                }
                _ => body.push(self.object_from_lexeme(lexeme, dicts)?),
            }
        }

        Ok(ArrayRef::new_procedure(body))
    }

    fn object_from_lexeme(&mut self, lexeme: Lexeme, dicts: &DictStack) -> PsResult<Object> {
        Ok(match lexeme.kind {
            LexemeKind::Number => parse_number(&lexeme.text),
            LexemeKind::Name => Object::executable_name(Name::new(&lexeme.text)),
            LexemeKind::LiteralName => Object::literal_name(Name::new(&lexeme.text)),
            LexemeKind::ImmediateName => {
                // immediately-evaluated: substituted at parse time
                let key = Name::new(&lexeme.text);
                match dicts.lookup(key) {
                    Some(obj) => obj,
                    None => anyhow::bail!(PostScriptError::Undefined { key }),
                }
            }
            LexemeKind::String => {
                Object::string(StringRef::from_bytes(process_escapes(&lexeme.text)))
            }
            LexemeKind::HexString => {
                Object::string(StringRef::from_bytes(eexec::decode_hex(&lexeme.text)?))
            }
            LexemeKind::LBracket | LexemeKind::DictOpen => Object::mark(),
            LexemeKind::RBracket => Object::executable_name(Name::new(b"]")),
            LexemeKind::DictClose => Object::executable_name(Name::new(b">>")),
            LexemeKind::UnterminatedString | LexemeKind::UnterminatedHexString => {
                anyhow::bail!(PostScriptError::SyntaxError)
            }
            LexemeKind::Delimiter => anyhow::bail!(PostScriptError::SyntaxError),
            LexemeKind::Comment
            | LexemeKind::DscComment
            | LexemeKind::LBrace
            | LexemeKind::RBrace
            | LexemeKind::EexecSwitch
            | LexemeKind::Eof => unreachable!("handled by the caller"),
        })
    }
}

/// Integer if whole and representable in 32-bit signed, else real.
/// A span that fails to parse falls back to name tokenization.
fn parse_number(text: &[u8]) -> Object {
    match try_parse_number(text) {
        Some(obj) => obj,
        None => Object::executable_name(Name::new(text)),
    }
}

fn try_parse_number(text: &[u8]) -> Option<Object> {
    let s = std::str::from_utf8(text).ok()?;

    // radix form: base#digits
    if let Some(hash) = s.find('#') {
        let (base_part, digit_part) = (&s[..hash], &s[hash + 1..]);

        let (negative, base_part) = match base_part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, base_part.strip_prefix('+').unwrap_or(base_part)),
        };

        let base: u32 = base_part.parse().ok()?;
        if !(2..=36).contains(&base) {
            return None;
        }

        let value = i64::from_str_radix(digit_part, base).ok()?;
        if value > i64::from(u32::MAX) {
            return None;
        }

        // radix numbers are 32-bit patterns; e.g. 16#FFFFFFFF is -1
        let mut n = value as u32 as i32;
        if negative {
            n = n.wrapping_neg();
        }

        return Some(Object::integer(n));
    }

    let value: f64 = s.parse().ok()?;

    if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Some(Object::integer(value as i32))
    } else {
        Some(Object::real(value))
    }
}

/// Resolve backslash escapes in a raw string span
fn process_escapes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();

    while let Some(b) = iter.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }

        match iter.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b'b') => out.push(BACKSPACE),
            Some(b'f') => out.push(FORM_FEED),
            Some(b'(') => out.push(b'('),
            Some(b')') => out.push(b')'),
            Some(b'\\') => out.push(b'\\'),
            // line continuation
            Some(b'\n') => {}
            Some(b'\r') => {
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            }
            Some(c @ b'0'..=b'7') => {
                let mut value = u32::from(c - b'0');

                for _ in 0..2 {
                    match iter.peek() {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }

                out.push(value as u8);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dictionary::{new_dict_ref, DictStack, Dictionary},
        object::Value,
    };

    fn empty_dicts() -> DictStack {
        DictStack::new(new_dict_ref(Dictionary::new()), new_dict_ref(Dictionary::new()))
    }

    fn parse_all(source: &[u8]) -> Vec<Object> {
        let dicts = empty_dicts();
        let mut parser = Parser::new(source.to_vec());
        let mut out = Vec::new();

        while let Some(obj) = parser.next_object(&dicts, 1).unwrap() {
            out.push(obj);
        }

        out
    }

    #[test]
    fn integer_classification() {
        let objs = parse_all(b"42 -17 3.5 1e3 2147483648 16#FF");

        assert!(objs[0].ps_eq(&Object::integer(42)));
        assert!(objs[1].ps_eq(&Object::integer(-17)));
        assert!(objs[2].ps_eq(&Object::real(3.5)));
        // whole and representable: integer
        assert!(objs[3].ps_eq(&Object::integer(1000)));
        // whole but out of i32 range: real
        assert!(objs[4].ps_eq(&Object::real(2147483648.0)));
        assert!(objs[5].ps_eq(&Object::integer(255)));
    }

    #[test]
    fn radix_is_a_bit_pattern() {
        let objs = parse_all(b"16#FFFFFFFF 2#1010");

        assert!(objs[0].ps_eq(&Object::integer(-1)));
        assert!(objs[1].ps_eq(&Object::integer(10)));
    }

    #[test]
    fn name_executability() {
        let objs = parse_all(b"moveto /moveto");

        assert!(objs[0].executable);
        assert!(!objs[1].executable);
    }

    #[test]
    fn procedures_nest() {
        let objs = parse_all(b"{ 1 { 2 } 3 }");

        assert_eq!(objs.len(), 1);
        assert!(objs[0].executable);

        let body = match &objs[0].value {
            Value::Array(arr) => arr.clone(),
            other => panic!("expected array, found {:?}", other),
        };

        assert!(body.is_procedure());
        assert_eq!(body.len(), 3);

        let nested = body.get(1).unwrap();
        assert!(nested.executable);
        assert!(matches!(nested.value, Value::Array(ref a) if a.is_procedure()));
    }

    #[test]
    fn string_escapes() {
        let objs = parse_all(br"(a\nb\051c\\d)");

        match &objs[0].value {
            Value::String(s) => assert_eq!(s.bytes(), b"a\nb)c\\d"),
            other => panic!("expected string, found {:?}", other),
        }
    }

    #[test]
    fn hex_string() {
        let objs = parse_all(b"<48 65 6c 6C 6f>");

        match &objs[0].value {
            Value::String(s) => assert_eq!(s.bytes(), b"Hello"),
            other => panic!("expected string, found {:?}", other),
        }
    }

    #[test]
    fn brackets_become_marks_and_names() {
        let objs = parse_all(b"[ ] << >>");

        assert!(objs[0].is_mark());
        assert!(matches!(objs[1].value, Value::Name(n) if n == Name::new(b"]")));
        assert!(objs[2].is_mark());
        assert!(matches!(objs[3].value, Value::Name(n) if n == Name::new(b">>")));
    }

    #[test]
    fn immediate_name_resolves_at_parse_time() {
        let dicts = {
            let system = new_dict_ref(Dictionary::new());
            system
                .borrow_mut()
                .insert(Name::new(b"x"), Object::integer(7));
            DictStack::new(system, new_dict_ref(Dictionary::new()))
        };

        let mut parser = Parser::new(b"//x".to_vec());
        let obj = parser.next_object(&dicts, 1).unwrap().unwrap();

        assert!(obj.ps_eq(&Object::integer(7)));
    }

    #[test]
    fn undefined_immediate_name_fails() {
        let dicts = empty_dicts();
        let mut parser = Parser::new(b"//missing".to_vec());

        assert!(parser.next_object(&dicts, 1).is_err());
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let dicts = empty_dicts();
        let mut parser = Parser::new(b"(never closed".to_vec());

        assert!(parser.next_object(&dicts, 1).is_err());
    }

    #[test]
    fn malformed_number_falls_back_to_name() {
        // '#' with a bad base scans as a number lexeme but parses as a name
        let objs = parse_all(b"99#ZZ");

        assert!(matches!(objs[0].value, Value::Name(_)));
    }
}
