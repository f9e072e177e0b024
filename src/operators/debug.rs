//! The print operators and the text renderings they share with `cvs`.

use std::io::Write;

use crate::{
    dictionary::Dictionary,
    error::PsResult,
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"=", op_print_shallow);
    op(dict, b"==", op_print_deep);
    op(dict, b"print", op_print);
    op(dict, b"stack", op_stack);
    op(dict, b"pstack", op_pstack);
    op(dict, b"flush", op_flush);
}

fn format_real(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// The rendering used by `=` and `cvs`: numbers and booleans as text,
/// strings by content, composites as markers
pub(crate) fn shallow_bytes(obj: &Object) -> Vec<u8> {
    match &obj.value {
        Value::Null => b"null".to_vec(),
        Value::Boolean(b) => if *b { b"true".to_vec() } else { b"false".to_vec() },
        Value::Integer(n) => n.to_string().into_bytes(),
        Value::Real(f) => format_real(*f).into_bytes(),
        Value::Mark => b"-mark-".to_vec(),
        Value::Name(name) => name.as_bytes().to_vec(),
        Value::String(s) => s.bytes(),
        Value::Array(arr) => format!("[...({})]", arr.len()).into_bytes(),
        Value::Dictionary(_) => b"<<...>>".to_vec(),
        Value::Operator(op) => format!("--{}--", op.name).into_bytes(),
        Value::File(_) => b"--file--".to_vec(),
        Value::Matrix(m) => format!(
            "[{} {} {} {} {} {}]",
            format_real(m.m[0]),
            format_real(m.m[1]),
            format_real(m.m[2]),
            format_real(m.m[3]),
            format_real(m.m[4]),
            format_real(m.m[5]),
        )
        .into_bytes(),
        Value::Path(path) => format!("--path({})--", path.borrow().segments.len()).into_bytes(),
        Value::FontFace(face) => format!("--fontface:{}--", face.info.postscript_name).into_bytes(),
        Value::Font(font) => format!("--font:{}--", font.face.info.postscript_name).into_bytes(),
        Value::Save(_) => b"--save--".to_vec(),
    }
}

/// The rendering used by `==`: syntactic form, recursing into composites
pub(crate) fn deep_bytes(obj: &Object) -> Vec<u8> {
    deep_bytes_bounded(obj, 0)
}

fn deep_bytes_bounded(obj: &Object, depth: usize) -> Vec<u8> {
    // self-referencing composites render shallowly past this point
    if depth > 8 {
        return shallow_bytes(obj);
    }

    match &obj.value {
        Value::Name(name) => {
            if obj.executable {
                name.as_bytes().to_vec()
            } else {
                format!("/{}", name).into_bytes()
            }
        }
        Value::String(s) => {
            let mut out = vec![b'('];
            out.extend_from_slice(&s.bytes());
            out.push(b')');
            out
        }
        Value::Array(arr) => {
            let (open, close) = if obj.executable || arr.is_procedure() {
                (b'{', b'}')
            } else {
                (b'[', b']')
            };

            let mut out = vec![open];
            for i in 0..arr.len() {
                if i > 0 {
                    out.push(b' ');
                }
                if let Ok(element) = arr.get(i) {
                    out.extend_from_slice(&deep_bytes_bounded(&element, depth + 1));
                }
            }
            out.push(close);
            out
        }
        Value::Dictionary(dict) => {
            let mut out = b"<<".to_vec();
            let mut first = true;

            let entries = dict.borrow().entries();
            for (key, value) in entries {
                if !first {
                    out.push(b' ');
                }
                first = false;

                out.extend_from_slice(format!("/{} ", key).as_bytes());
                out.extend_from_slice(&deep_bytes_bounded(&value, depth + 1));
            }

            out.extend_from_slice(b">>");
            out
        }
        _ => shallow_bytes(obj),
    }
}

fn op_print_shallow(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let mut text = shallow_bytes(&obj);
    text.push(b'\n');

    interp.out.write_all(&text)?;
    Ok(())
}

fn op_print_deep(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let mut text = deep_bytes(&obj);
    text.push(b'\n');

    interp.out.write_all(&text)?;
    Ok(())
}

/// string `print` — the raw bytes, no newline
fn op_print(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.pop_string()?;

    interp.out.write_all(&s.bytes())?;
    Ok(())
}

/// The whole operand stack, top first, without disturbing it
fn op_stack(interp: &mut Interpreter) -> PsResult<()> {
    let lines: Vec<Vec<u8>> = interp
        .operand_stack
        .iter()
        .rev()
        .map(shallow_bytes)
        .collect();

    for mut line in lines {
        line.push(b'\n');
        interp.out.write_all(&line)?;
    }

    Ok(())
}

fn op_pstack(interp: &mut Interpreter) -> PsResult<()> {
    let lines: Vec<Vec<u8>> = interp.operand_stack.iter().rev().map(deep_bytes).collect();

    for mut line in lines {
        line.push(b'\n');
        interp.out.write_all(&line)?;
    }

    Ok(())
}

fn op_flush(interp: &mut Interpreter) -> PsResult<()> {
    interp.out.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn output_of(source: &[u8]) -> String {
        let out = SharedOutput::default();
        let mut interp = Interpreter::new(source);
        interp.set_output(Box::new(out.clone()));
        interp.run().unwrap();

        let bytes = out.0.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn shallow_prints_content() {
        assert_eq!(output_of(b"42 ="), "42\n");
        assert_eq!(output_of(b"2.5 ="), "2.5\n");
        assert_eq!(output_of(b"3.0 ="), "3.0\n");
        assert_eq!(output_of(b"(hi) ="), "hi\n");
        assert_eq!(output_of(b"true ="), "true\n");
    }

    #[test]
    fn deep_prints_syntax() {
        assert_eq!(output_of(b"(hi) =="), "(hi)\n");
        assert_eq!(output_of(b"/nm =="), "/nm\n");
        assert_eq!(output_of(b"[1 (a)] =="), "[1 (a)]\n");
        assert_eq!(output_of(b"{ 1 add } =="), "{1 add}\n");
    }

    #[test]
    fn print_writes_raw_bytes() {
        assert_eq!(output_of(b"(a) print (b) print"), "ab");
    }

    #[test]
    fn stack_lists_top_first() {
        assert_eq!(output_of(b"1 2 stack"), "2\n1\n");
    }
}
