//! File operators and filters.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    file::{FileRef, PsFile},
    interpreter::Interpreter,
    object::Object,
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"file", op_file);
    op(dict, b"currentfile", op_currentfile);
    op(dict, b"closefile", op_closefile);
    op(dict, b"read", op_read);
    op(dict, b"readstring", op_readstring);
    op(dict, b"readhexstring", op_readhexstring);
    op(dict, b"readline", op_readline);
    op(dict, b"bytesavailable", op_bytesavailable);
    op(dict, b"fileposition", op_fileposition);
    op(dict, b"setfileposition", op_setfileposition);
    op(dict, b"resetfile", op_resetfile);
    op(dict, b"filter", op_filter);
    op(dict, b"run", op_run);
}

/// (filename) (access) `file` — only read access; the file is pulled into
/// memory whole
fn op_file(interp: &mut Interpreter) -> PsResult<()> {
    let access = interp.pop_string()?;
    let filename = interp.pop_string()?;

    if access.bytes() != b"r" {
        anyhow::bail!(PostScriptError::InvalidFileAccess);
    }

    let path = String::from_utf8_lossy(&filename.bytes()).into_owned();

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(_) => anyhow::bail!(PostScriptError::IoError),
    };

    interp.push(Object::file(PsFile::memory(data)))
}

/// The file object the interpreter is currently executing; reads through it
/// consume program text
fn op_currentfile(interp: &mut Interpreter) -> PsResult<()> {
    match interp.current_file() {
        Some(file) => interp.push(Object::file(file)),
        None => anyhow::bail!(PostScriptError::InvalidFileAccess),
    }
}

/// Executing closefile on a file that has already been closed has no effect
fn op_closefile(interp: &mut Interpreter) -> PsResult<()> {
    let file = interp.pop_file()?;

    file.borrow_mut().close();

    Ok(())
}

/// file `read` — byte true, or false at end of file. EOF is a result, not
/// an error.
fn op_read(interp: &mut Interpreter) -> PsResult<()> {
    let file = interp.pop_file()?;

    let byte = file.borrow_mut().read_byte();

    match byte {
        Some(b) => {
            interp.push(Object::integer(i32::from(b)))?;
            interp.push(Object::boolean(true))
        }
        None => interp.push(Object::boolean(false)),
    }
}

fn skip_one_separator(file: &FileRef) {
    let mut f = file.borrow_mut();

    if let PsFile::Memory(src) = &mut *f {
        if matches!(src.peek_byte(), Some(b) if b.is_ascii_whitespace() || b == b'\0') {
            src.cursor += 1;
        }
    }
}

/// file string `readstring` — fill the string's buffer and report the part
/// actually read plus whether it was filled completely
fn op_readstring(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop_string()?;
    let file = interp.pop_file()?;

    // the byte separating the operator from the data is not data
    skip_one_separator(&file);

    let capacity = target.capacity();
    let mut count = 0;

    while count < capacity {
        let byte = file.borrow_mut().read_byte();

        match byte {
            Some(b) => {
                target.put(count, b)?;
                count += 1;
            }
            None => break,
        }
    }

    interp.push(Object::string(target.truncated(count)))?;
    interp.push(Object::boolean(count == capacity))
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// file string `readhexstring` — whitespace between digits is ignored; the
/// first non-hex byte ends the read
fn op_readhexstring(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop_string()?;
    let file = interp.pop_file()?;

    let capacity = target.capacity();
    let mut count = 0;

    'outer: while count < capacity {
        let mut nibbles = [0u8; 2];

        for (slot_idx, slot) in nibbles.iter_mut().enumerate() {
            loop {
                let byte = file.borrow_mut().read_byte();

                match byte {
                    Some(b) if b <= 0x20 => continue,
                    Some(b) => match hex_value(b) {
                        Some(n) => {
                            *slot = n;
                            break;
                        }
                        None => break 'outer,
                    },
                    None => {
                        if slot_idx == 1 {
                            // odd trailing nibble: pad with zero
                            target.put(count, nibbles[0] << 4)?;
                            count += 1;
                        }
                        break 'outer;
                    }
                }
            }
        }

        target.put(count, (nibbles[0] << 4) | nibbles[1])?;
        count += 1;
    }

    interp.push(Object::string(target.truncated(count)))?;
    interp.push(Object::boolean(count == capacity))
}

/// file string `readline` — bytes up to the next line ending; false when
/// end of file arrived first
fn op_readline(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop_string()?;
    let file = interp.pop_file()?;

    let mut count = 0;
    let mut saw_newline = false;

    loop {
        let byte = file.borrow_mut().read_byte();

        match byte {
            Some(b'\n') => {
                saw_newline = true;
                break;
            }
            Some(b'\r') => {
                // accept \r and \r\n
                let mut f = file.borrow_mut();
                if let PsFile::Memory(src) = &mut *f {
                    if src.peek_byte() == Some(b'\n') {
                        src.cursor += 1;
                    }
                }
                saw_newline = true;
                break;
            }
            Some(b) => {
                if count >= target.capacity() {
                    anyhow::bail!(PostScriptError::RangeCheck);
                }

                target.put(count, b)?;
                count += 1;
            }
            None => break,
        }
    }

    interp.push(Object::string(target.truncated(count)))?;
    interp.push(Object::boolean(saw_newline))
}

fn op_bytesavailable(interp: &mut Interpreter) -> PsResult<()> {
    let file = interp.pop_file()?;

    let available = file.borrow().bytes_available();
    interp.push(Object::integer(available))
}

fn op_fileposition(interp: &mut Interpreter) -> PsResult<()> {
    let file = interp.pop_file()?;

    let position = file.borrow().position()?;
    interp.push(Object::integer(position as i32))
}

fn op_setfileposition(interp: &mut Interpreter) -> PsResult<()> {
    let position = interp.pop_usize()?;
    let file = interp.pop_file()?;

    let result = file.borrow_mut().set_position(position);
    result
}

fn op_resetfile(interp: &mut Interpreter) -> PsResult<()> {
    let file = interp.pop_file()?;

    let result = file.borrow_mut().rewind();
    result
}

/// source /FilterName `filter` — wrap the upstream file in a decode filter
fn op_filter(interp: &mut Interpreter) -> PsResult<()> {
    let name = interp.pop_name()?;
    let source = interp.pop()?;

    let upstream: FileRef = match source.value {
        crate::object::Value::File(file) => file,
        // a string source reads its bytes
        crate::object::Value::String(s) => PsFile::memory(s.bytes()),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    let filtered = match name.as_bytes() {
        b"ASCII85Decode" => PsFile::ascii85(upstream),
        b"RunLengthDecode" => PsFile::run_length(upstream),
        _ => anyhow::bail!(PostScriptError::Undefined { key: name }),
    };

    interp.push(Object::file(filtered))
}

/// (filename) `run` — execute a source file; its cancellation state
/// propagates to the caller
fn op_run(interp: &mut Interpreter) -> PsResult<()> {
    let filename = interp.pop_string()?;

    let path = String::from_utf8_lossy(&filename.bytes()).into_owned();

    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(_) => anyhow::bail!(PostScriptError::IoError),
    };

    interp.run_nested_source(data)
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
    fn read_returns_false_at_eof() {
        let mut interp = run(b"currentfile read pop currentfile read");

        // nothing follows the second `read`, so it reports EOF
        assert!(!interp.pop_bool().unwrap());
        // the first read consumed the separator-adjacent byte 'c' of
        // "currentfile" — no: it consumed the next byte of the stream,
        // which is the space before `read`
        assert_eq!(interp.pop_int().unwrap(), b' ' as i32);
    }

    #[test]
    fn readhexstring_skips_whitespace() {
        let mut interp = run(b"currentfile 3 string readhexstring 48 65 6c pop");

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"Hel");
    }

    #[test]
    fn readline_reads_to_line_end() {
        let mut interp = run(b"currentfile 20 string readline first line\npop");

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b" first line");
    }

    #[test]
    fn ascii85_filter_decodes_program_data() {
        let mut interp = run(
            b"currentfile /ASCII85Decode filter 9 string readstring 9jqo^F*2M7/c~> pop",
        );

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"Man sure.");
    }

    #[test]
    fn runlength_filter_decodes() {
        // 0x02 'a' 'b' 'c' then EOD(128), ASCII85'd would be clearer but
        // raw bytes work through a string source
        let mut interp = run(b"(\\002abcd\\200) /RunLengthDecode filter 3 string readstring");

        assert!(interp.pop_bool().unwrap());
        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"abc");
    }

    #[test]
    fn fileposition_tracks_reads() {
        let mut interp = run(b"(abcdef) /ASCII85Decode pop pop currentfile fileposition");

        // position is wherever the lexer cursor stands after `fileposition`
        let pos = interp.pop_int().unwrap();
        assert!(pos > 0);
    }
}
