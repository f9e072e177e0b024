//! Batch runner: execute a PostScript source file against a raster sink
//! and write the page out as PNG.

use std::{cell::RefCell, path::PathBuf, process::ExitCode, rc::Rc};

use ps::{Interpreter, RasterDevice};

const DEFAULT_WIDTH: usize = 612;
const DEFAULT_HEIGHT: usize = 792;

fn output_path(input: &str) -> PathBuf {
    match input.strip_suffix(".ps") {
        Some(stem) => PathBuf::from(format!("{}.png", stem)),
        None => PathBuf::from(format!("{}.png", input)),
    }
}

fn parse_size(arg: &str) -> Option<(usize, usize)> {
    let (w, h) = arg.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);

    let input = match args.next() {
        Some(input) => input,
        None => {
            eprintln!("usage: psrun FILE.ps [WIDTHxHEIGHT]");
            return ExitCode::from(1);
        }
    };

    let (width, height) = args
        .next()
        .as_deref()
        .and_then(parse_size)
        .unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));

    let source = match std::fs::read(&input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("psrun: cannot open {}: {}", input, err);
            return ExitCode::from(1);
        }
    };

    let device = Rc::new(RefCell::new(RasterDevice::new(width, height)));

    let mut interpreter = Interpreter::with_device(&source, Box::new(Rc::clone(&device)));

    if let Err(err) = interpreter.run() {
        eprintln!("psrun: {}: {}", input, err);
    }

    let output = output_path(&input);

    if let Err(err) = device.borrow().write_png(&output) {
        eprintln!("psrun: cannot write {}: {}", output.display(), err);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
