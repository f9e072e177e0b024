//! Font operators: lookup, sizing, and text.

use std::rc::Rc;

use log::warn;

use crate::{
    dictionary::{new_dict_ref, DictRef, Dictionary},
    error::{PostScriptError, PsResult},
    font::{FaceInfo, Font, FontFace},
    interpreter::Interpreter,
    matrix::Matrix,
    name::Name,
    object::{ArrayRef, Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"findfont", op_findfont);
    op(dict, b"scalefont", op_scalefont);
    op(dict, b"makefont", op_makefont);
    op(dict, b"setfont", op_setfont);
    op(dict, b"currentfont", op_currentfont);
    op(dict, b"definefont", op_definefont);
    op(dict, b"show", op_show);
    op(dict, b"stringwidth", op_stringwidth);
    op(dict, b"charpath", op_charpath);
}

fn font_directory(interp: &Interpreter) -> Option<DictRef> {
    match interp
        .dicts
        .system_dict()
        .borrow()
        .get(Name::new(b"FontDirectory"))
    {
        Some(Object {
            value: Value::Dictionary(dict),
            ..
        }) => Some(Rc::clone(dict)),
        _ => None,
    }
}

fn font_map_alias(interp: &Interpreter, key: Name) -> Option<Name> {
    let map = match interp
        .dicts
        .system_dict()
        .borrow()
        .get(Name::new(b"FontMap"))
    {
        Some(Object {
            value: Value::Dictionary(dict),
            ..
        }) => Rc::clone(dict),
        _ => return None,
    };

    let result = match map.borrow().get(key) {
        Some(Object {
            value: Value::Name(alias),
            ..
        }) => Some(*alias),
        Some(Object {
            value: Value::String(s),
            ..
        }) => Some(Name::new(&s.bytes())),
        _ => None,
    };
    result
}

/// A face from an already-registered font dictionary
fn face_from_dict(interp: &Interpreter, name: Name, dict: DictRef) -> Rc<FontFace> {
    let info = interp
        .faces
        .find_face(name.as_bytes())
        .unwrap_or_else(|| FaceInfo::synthetic(&name.to_string()));

    Rc::new(FontFace {
        dict,
        info,
        backend: None,
    })
}

/// key `findfont` font — FontDirectory first, then the Font resource
/// category, then a FontMap alias, then the discovery collaborator
fn op_findfont(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop_name()?;

    let face = find_face(interp, key, 0)?;

    interp.push(Object::literal(Value::FontFace(face)))
}

fn find_face(interp: &mut Interpreter, key: Name, depth: usize) -> PsResult<Rc<FontFace>> {
    if depth > 4 {
        anyhow::bail!(PostScriptError::InvalidFont);
    }

    if let Some(directory) = font_directory(interp) {
        let registered = directory.borrow().get(key).cloned();

        if let Some(Object {
            value: Value::Dictionary(dict),
            ..
        }) = registered
        {
            return Ok(face_from_dict(interp, key, dict));
        }
    }

    let resource = interp.resources.find(Name::new(b"Font"), key);
    if let Some(Object {
        value: Value::Dictionary(dict),
        ..
    }) = resource
    {
        return Ok(face_from_dict(interp, key, dict));
    }

    if let Some(alias) = font_map_alias(interp, key) {
        if alias != key {
            return find_face(interp, alias, depth + 1);
        }
    }

    match interp.faces.find_face(key.as_bytes()) {
        Some(info) => {
            let dict = new_dict_ref(Dictionary::new());
            dict.borrow_mut()
                .insert(Name::new(b"FontName"), Object::literal_name(key));
            dict.borrow_mut()
                .insert(Name::new(b"FontType"), Object::integer(1));

            Ok(Rc::new(FontFace {
                dict,
                info,
                backend: None,
            }))
        }
        None => {
            warn!("findfont: no face for {:?}", key);
            anyhow::bail!(PostScriptError::InvalidFont)
        }
    }
}

fn pop_face(interp: &mut Interpreter) -> PsResult<Rc<FontFace>> {
    let obj = interp.pop()?;

    match obj.value {
        Value::FontFace(face) => Ok(face),
        // a bare font dictionary works too
        Value::Dictionary(dict) => {
            let name = match dict.borrow().get(Name::new(b"FontName")) {
                Some(Object {
                    value: Value::Name(name),
                    ..
                }) => *name,
                _ => Name::new(b""),
            };

            Ok(face_from_dict(interp, name, dict))
        }
        // rescaling an already-sized font starts from its face
        Value::Font(font) => Ok(Rc::clone(&font.face)),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn reject_composite(face: &FontFace) -> PsResult<()> {
    if face.dict.borrow().contains(Name::new(b"FMapType")) {
        anyhow::bail!(PostScriptError::InvalidFont);
    }

    Ok(())
}

fn op_scalefont(interp: &mut Interpreter) -> PsResult<()> {
    let scale = interp.pop_number()?;
    let face = pop_face(interp)?;

    let font = Font::new(face, Matrix::scaling(scale, scale));

    interp.push(Object::literal(Value::Font(Rc::new(font))))
}

fn op_makefont(interp: &mut Interpreter) -> PsResult<()> {
    let matrix = interp.pop_matrix()?;
    let face = pop_face(interp)?;

    let font = Font::new(face, matrix);

    interp.push(Object::literal(Value::Font(Rc::new(font))))
}

fn op_setfont(interp: &mut Interpreter) -> PsResult<()> {
    let font = match interp.pop()?.value {
        Value::Font(font) => font,
        // an unsized face is usable at its natural size
        Value::FontFace(face) => Rc::new(Font::new(face, Matrix::identity())),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    reject_composite(&font.face)?;

    interp.device.set_font(&font);
    interp.gstate.font = Some(font);

    Ok(())
}

fn op_currentfont(interp: &mut Interpreter) -> PsResult<()> {
    match &interp.gstate.font {
        Some(font) => {
            let font = Rc::clone(font);
            interp.push(Object::literal(Value::Font(font)))
        }
        None => anyhow::bail!(PostScriptError::InvalidFont),
    }
}

/// key font `definefont` font — registers into FontDirectory
fn op_definefont(interp: &mut Interpreter) -> PsResult<()> {
    let font = interp.pop_dict()?;
    let key = interp.pop_name()?;

    if font.borrow().contains(Name::new(b"FMapType")) {
        anyhow::bail!(PostScriptError::InvalidFont);
    }

    font.borrow_mut()
        .insert(Name::new(b"FontName"), Object::literal_name(key));

    if let Some(directory) = font_directory(interp) {
        directory
            .borrow_mut()
            .insert(key, Object::dictionary(Rc::clone(&font)));
    }

    interp.push(Object::dictionary(font))
}

fn current_font(interp: &Interpreter) -> PsResult<Rc<Font>> {
    match &interp.gstate.font {
        Some(font) => Ok(Rc::clone(font)),
        None => anyhow::bail!(PostScriptError::InvalidFont),
    }
}

/// string `show` — paint at the current point, advance by the string width
fn op_show(interp: &mut Interpreter) -> PsResult<()> {
    let text = interp.pop_string()?;
    let font = current_font(interp)?;

    let ctm = interp.gstate.ctm;
    let start = interp.gstate.path.current_point_user(&ctm)?;

    let bytes = text.bytes();

    interp.device.show_text(&interp.gstate, &bytes)?;

    let (dx, dy) = interp.device.string_width(&font, &bytes);
    interp
        .gstate
        .path
        .move_to(&ctm, start.x + dx, start.y + dy);

    Ok(())
}

fn op_stringwidth(interp: &mut Interpreter) -> PsResult<()> {
    let text = interp.pop_string()?;
    let font = current_font(interp)?;

    let (dx, dy) = interp.device.string_width(&font, &text.bytes());

    interp.push(Object::real(dx))?;
    interp.push(Object::real(dy))
}

/// string bool `charpath` — append the glyph outlines to the current path
fn op_charpath(interp: &mut Interpreter) -> PsResult<()> {
    let _stroked = interp.pop_bool()?;
    let text = interp.pop_string()?;
    let font = current_font(interp)?;

    let ctm = interp.gstate.ctm;
    let start = interp.gstate.path.current_point_user(&ctm)?;

    let outline = interp.device.char_path(&interp.gstate, &text.bytes());

    interp
        .gstate
        .path
        .segments
        .extend_from_slice(&outline.segments);

    let (dx, dy) = interp.device.string_width(&font, &text.bytes());
    interp
        .gstate
        .path
        .move_to(&ctm, start.x + dx, start.y + dy);

    Ok(())
}

/// The standard encoding vector: glyph names for the printable ASCII range,
/// `.notdef` elsewhere
pub(crate) fn standard_encoding() -> ArrayRef {
    const PUNCT_LOW: [&str; 33] = [
        "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand",
        "quoteright", "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period",
        "slash", "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
        "colon", "semicolon", "less", "equal", "greater", "question", "at",
    ];
    const PUNCT_MID: [&str; 6] = [
        "bracketleft",
        "backslash",
        "bracketright",
        "asciicircum",
        "underscore",
        "quoteleft",
    ];
    const PUNCT_HIGH: [&str; 4] = ["braceleft", "bar", "braceright", "asciitilde"];

    let notdef = Name::new(b".notdef");
    let mut names = vec![Object::literal_name(notdef); 256];

    let mut install = |code: usize, glyph: &str| {
        names[code] = Object::literal_name(Name::new(glyph.as_bytes()));
    };

    for (i, glyph) in PUNCT_LOW.iter().enumerate() {
        install(0x20 + i, glyph);
    }

    for c in b'A'..=b'Z' {
        let glyph = (c as char).to_string();
        install(c as usize, &glyph);
    }

    for (i, glyph) in PUNCT_MID.iter().enumerate() {
        install(0x5B + i, glyph);
    }

    for c in b'a'..=b'z' {
        let glyph = (c as char).to_string();
        install(c as usize, &glyph);
    }

    for (i, glyph) in PUNCT_HIGH.iter().enumerate() {
        install(0x7B + i, glyph);
    }

    ArrayRef::from_objects(names)
}

#[cfg(test)]
mod test {
    use crate::interpreter::Interpreter;

    fn run(source: &[u8]) -> Interpreter {
        let mut interp = Interpreter::new(source);
        interp.run().unwrap();
        interp
    }

    #[test]
    fn findfont_scalefont_setfont() {
        let mut interp = run(b"/Helvetica findfont 12 scalefont setfont currentfont");

        let font = match interp.pop().unwrap().value {
            crate::object::Value::Font(font) => font,
            other => panic!("expected font, found {:?}", other),
        };

        assert!((font.size() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn definefont_registers_for_findfont() {
        let mut interp = run(
            b"/MyFont 4 dict dup /FontType 3 put definefont pop /MyFont findfont pop",
        );

        assert!(interp.pop().is_err());
    }

    #[test]
    fn fontmap_aliases_names() {
        let mut interp = run(
            b"/Custom 2 dict dup /FontType 3 put definefont pop \
              FontMap /Aliased /Custom put \
              /Aliased findfont",
        );

        let face = match interp.pop().unwrap().value {
            crate::object::Value::FontFace(face) => face,
            other => panic!("expected face, found {:?}", other),
        };

        assert!(face.dict.borrow().contains(crate::name::Name::new(b"FontType")));
    }

    #[test]
    fn show_advances_the_current_point() {
        let mut interp = run(
            b"/F findfont 10 scalefont setfont 0 0 moveto (abc) show currentpoint",
        );

        assert_eq!(interp.pop_number().unwrap(), 0.0);
        // three glyphs at 0.6 em each at size 10
        assert!((interp.pop_number().unwrap() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn stringwidth_reports_the_advance() {
        let mut interp = run(b"/F findfont 10 scalefont setfont (ab) stringwidth");

        assert_eq!(interp.pop_number().unwrap(), 0.0);
        assert!((interp.pop_number().unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn composite_fonts_are_rejected() {
        let mut interp = Interpreter::new(b"/C 2 dict dup /FMapType 2 put definefont");
        assert!(interp.run().is_err());
    }

    #[test]
    fn standard_encoding_maps_ascii() {
        let encoding = super::standard_encoding();

        assert_eq!(encoding.len(), 256);

        let a = encoding.get(b'a' as usize).unwrap();
        match a.value {
            crate::object::Value::Name(name) => assert_eq!(name.as_bytes(), b"a"),
            other => panic!("expected name, found {:?}", other),
        }

        let nul = encoding.get(0).unwrap();
        match nul.value {
            crate::object::Value::Name(name) => assert_eq!(name.as_bytes(), b".notdef"),
            other => panic!("expected name, found {:?}", other),
        }
    }
}
