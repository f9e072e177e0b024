//! Interactive loop: prompt, read a line, feed it to the VM.

use std::io::{self, BufRead, Write};

use ps::Interpreter;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut interpreter = Interpreter::new(b"");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        stdout.write_all(b"PS> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        if let Err(err) = interpreter.execute_source(trimmed.as_bytes().to_vec()) {
            eprintln!("error: {}", err);
        }

        if interpreter.quit_requested() {
            break;
        }
    }

    Ok(())
}
