//! The virtual machine: four stacks, the run loop, and error routing.
//!
//! The execution stack holds explicit frames; procedure bodies are walked
//! with an iterator record (array + index) rather than host recursion, so
//! deeply nested procedures cannot overflow the host stack.

use std::{
    io::{self, Write},
    rc::Rc,
};

use log::debug;

use crate::{
    device::{Device, NulDevice},
    dictionary::{new_dict_ref, DictRef, DictStack, Dictionary},
    error::{PostScriptError, PsResult},
    font::{FaceSource, PermissiveFaceSource},
    graphics_state::GraphicsState,
    matrix::Matrix,
    name::Name,
    object::{ArrayRef, Object, SaveRecord, StringRef, Value},
    operators,
    parser::Parser,
    resource::ResourceStack,
};

const OPERAND_STACK_LIMIT: usize = 5000;
const EXEC_STACK_LIMIT: usize = 1000;

#[derive(Debug)]
enum Frame {
    Single(Object),
    Proc { body: ArrayRef, index: usize },
}

pub struct Interpreter {
    parser: Parser,

    pub(crate) operand_stack: Vec<Object>,
    exec_stack: Vec<Frame>,
    pub(crate) dicts: DictStack,

    pub(crate) gstate: GraphicsState,
    pub(crate) gstate_stack: Vec<GraphicsState>,

    pub(crate) resources: ResourceStack,
    pub(crate) device: Box<dyn Device>,
    pub(crate) faces: Box<dyn FaceSource>,
    pub(crate) out: Box<dyn Write>,

    pub(crate) exit_requested: bool,
    pub(crate) stop_requested: bool,
    pub(crate) quit_requested: bool,
    pending_error: Option<anyhow::Error>,
    handling_error: bool,

    pub(crate) rand_state: u32,
    save_generation: u64,

    /// PageSize as set by `setpagedevice`; the sink decides what to do
    /// with it
    pub(crate) page_size: (f64, f64),
}

impl Interpreter {
    pub fn new(source: &[u8]) -> Self {
        Self::with_device(source, Box::new(NulDevice))
    }

    pub fn with_device(source: &[u8], device: Box<dyn Device>) -> Self {
        let system_dict = new_dict_ref(Dictionary::with_capacity(512));
        let user_dict = new_dict_ref(Dictionary::new());

        let mut interpreter = Self {
            parser: Parser::new(source.to_vec()),
            operand_stack: Vec::new(),
            exec_stack: Vec::new(),
            dicts: DictStack::new(Rc::clone(&system_dict), Rc::clone(&user_dict)),
            gstate: GraphicsState::default(),
            gstate_stack: Vec::new(),
            resources: ResourceStack::new(),
            device,
            faces: Box::new(PermissiveFaceSource),
            out: Box::new(io::stdout()),
            exit_requested: false,
            stop_requested: false,
            quit_requested: false,
            pending_error: None,
            handling_error: false,
            rand_state: 1,
            save_generation: 0,
            page_size: (612.0, 792.0),
        };

        {
            let mut system = system_dict.borrow_mut();

            operators::install_all(&mut system);

            system.insert(Name::new(b"true"), Object::boolean(true));
            system.insert(Name::new(b"false"), Object::boolean(false));
            system.insert(Name::new(b"null"), Object::null());
            system.insert(Name::new(b"languagelevel"), Object::integer(2));

            system.insert(
                Name::new(b"systemdict"),
                Object::dictionary(Rc::clone(&system_dict)),
            );
            system.insert(
                Name::new(b"userdict"),
                Object::dictionary(Rc::clone(&user_dict)),
            );

            let bootstrap_dicts: [&[u8]; 4] = [b"errordict", b"$error", b"FontDirectory", b"FontMap"];
            for dict_name in bootstrap_dicts {
                system.insert(
                    Name::new(dict_name),
                    Object::dictionary(new_dict_ref(Dictionary::new())),
                );
            }

            system.insert(
                Name::new(b"StandardEncoding"),
                Object::array(crate::operators::font::standard_encoding()),
            );
        }

        interpreter
    }

    pub fn set_output(&mut self, out: Box<dyn Write>) {
        self.out = out;
    }

    pub fn set_face_source(&mut self, faces: Box<dyn FaceSource>) {
        self.faces = faces;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Execute the program the interpreter was constructed over
    pub fn run(&mut self) -> PsResult<()> {
        self.run_stream(1)?;
        self.finish_stream()
    }

    /// Feed an additional chunk of source (a REPL line) through the VM
    pub fn execute_source(&mut self, bytes: Vec<u8>) -> PsResult<()> {
        self.run_nested_source(bytes)?;
        self.finish_stream()
    }

    /// Run a nested source to completion without normalizing the exit/stop
    /// flags; `run` and executable strings use this so cancellation
    /// propagates to the enclosing context
    pub(crate) fn run_nested_source(&mut self, bytes: Vec<u8>) -> PsResult<()> {
        self.parser.lexer.push_source(bytes);
        let depth = self.parser.lexer.depth();
        self.run_stream(depth)
    }

    fn finish_stream(&mut self) -> PsResult<()> {
        self.exit_requested = false;

        if self.stop_requested {
            self.stop_requested = false;

            if let Some(err) = self.pending_error.take() {
                return Err(err);
            }
        }

        Ok(())
    }

    /// Read objects from the parser and execute them until the stream at
    /// `min_depth` is exhausted or a flag unwinds it
    fn run_stream(&mut self, min_depth: usize) -> PsResult<()> {
        loop {
            if self.exit_requested || self.stop_requested || self.quit_requested {
                break;
            }

            let obj = match self.parser.next_object(&self.dicts, min_depth) {
                Ok(Some(obj)) => obj,
                Ok(None) => break,
                Err(err) => {
                    self.handle_error(None, err)?;
                    continue;
                }
            };

            // deferred execution: a procedure coming out of the scanner is
            // data; it only runs when reached through a name or `exec`
            let is_procedure_literal = matches!(obj.value, Value::Array(_));

            let outcome = if obj.executable && !is_procedure_literal {
                self.execute_object(obj)
            } else {
                self.push(obj)
            };

            if let Err(err) = outcome {
                self.handle_error(None, err)?;
            }
        }

        // drop any leftover nested sources so the outer stream resumes
        // cleanly after an early unwind
        if min_depth > 1 {
            self.parser.lexer.truncate(min_depth - 1);
        }

        Ok(())
    }

    /// Push one object as an exec frame and run until it completes
    pub(crate) fn execute_object(&mut self, obj: Object) -> PsResult<()> {
        self.execute_frame(Frame::Single(obj))
    }

    pub(crate) fn execute_proc(&mut self, body: &ArrayRef) -> PsResult<()> {
        self.execute_frame(Frame::Proc {
            body: body.clone(),
            index: 0,
        })
    }

    fn execute_frame(&mut self, frame: Frame) -> PsResult<()> {
        let base = self.exec_stack.len();

        let result = match self.push_exec(frame) {
            Ok(()) => self.run_exec(base),
            Err(err) => Err(err),
        };

        // leave no partial frames behind when an error propagates
        if result.is_err() {
            self.exec_stack.truncate(base);
        }

        result
    }

    fn push_exec(&mut self, frame: Frame) -> PsResult<()> {
        if self.exec_stack.len() >= EXEC_STACK_LIMIT {
            anyhow::bail!(PostScriptError::LimitCheck);
        }

        self.exec_stack.push(frame);
        Ok(())
    }

    fn run_exec(&mut self, base: usize) -> PsResult<()> {
        while self.exec_stack.len() > base {
            if self.exit_requested || self.stop_requested || self.quit_requested {
                self.exec_stack.truncate(base);
                return Ok(());
            }

            // the next item, and whether it came out of a procedure body;
            // None means the top procedure frame is exhausted
            let proc_element: Option<Option<Object>> = match self.exec_stack.last_mut().unwrap() {
                Frame::Proc { body, index } => {
                    if *index >= body.len() {
                        Some(None)
                    } else {
                        let obj = body.get(*index)?;
                        *index += 1;
                        Some(Some(obj))
                    }
                }
                Frame::Single(_) => None,
            };

            let (obj, from_proc) = match proc_element {
                Some(None) => {
                    self.exec_stack.pop();
                    continue;
                }
                Some(Some(obj)) => (obj, true),
                None => match self.exec_stack.pop() {
                    Some(Frame::Single(obj)) => (obj, false),
                    _ => unreachable!(),
                },
            };

            if !obj.executable {
                if let Err(err) = self.push(obj) {
                    self.handle_error(None, err)?;
                }
                continue;
            }

            match obj.value {
                // resolve through the dictionary stack and execute the value
                Value::Name(name) => match self.dicts.load(name) {
                    Ok(resolved) => {
                        if resolved.executable {
                            self.push_exec(Frame::Single(resolved))?;
                        } else if let Err(err) = self.push(resolved) {
                            self.handle_error(Some(name), err)?;
                        }
                    }
                    Err(err) => self.handle_error(Some(name), err)?,
                },
                Value::Operator(op) => self.invoke(op)?,
                Value::Array(body) => {
                    if from_proc {
                        // a procedure reached inside a procedure is data
                        if let Err(err) = self.push(Object::procedure(body)) {
                            self.handle_error(None, err)?;
                        }
                    } else {
                        self.push_exec(Frame::Proc { body, index: 0 })?;
                    }
                }
                Value::String(s) => {
                    if from_proc {
                        if let Err(err) = self.push(Object {
                            value: Value::String(s),
                            executable: true,
                        }) {
                            self.handle_error(None, err)?;
                        }
                    } else {
                        // parsed as source on demand
                        self.run_nested_source(s.bytes())?;
                    }
                }
                // the executable bit is ignored for everything else
                other => {
                    let obj = Object {
                        value: other,
                        executable: true,
                    };

                    if let Err(err) = self.push(obj) {
                        self.handle_error(None, err)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Call an operator; on failure the operand stack is restored so the
    /// failed operator has no net stack effect
    fn invoke(&mut self, op: crate::object::Operator) -> PsResult<()> {
        let saved = self.operand_stack.clone();

        match (op.func)(self) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.operand_stack = saved;
                self.handle_error(Some(op.name), err)
            }
        }
    }

    /// Route an error through `errordict`: record context in `$error`, run
    /// a registered handler if there is one, and otherwise invoke `stop`
    fn handle_error(&mut self, command: Option<Name>, err: anyhow::Error) -> PsResult<()> {
        let ps_err = match err.downcast_ref::<PostScriptError>() {
            Some(ps_err) => ps_err.clone(),
            // host errors are not part of the language model
            None => return Err(err),
        };

        debug!("error {} in {:?}", ps_err, command);

        let error_name = Name::new(ps_err.name());

        if let Some(dollar_error) = self.system_lookup_dict(b"$error") {
            let mut record = dollar_error.borrow_mut();
            record.insert(Name::new(b"newerror"), Object::boolean(true));
            record.insert(Name::new(b"errorname"), Object::literal_name(error_name));
            record.insert(
                Name::new(b"command"),
                match command {
                    Some(name) => Object::literal_name(name),
                    None => Object::null(),
                },
            );
            record.insert(
                Name::new(b"ostack"),
                Object::array(ArrayRef::from_objects(self.operand_stack.clone())),
            );
        }

        let handler = self
            .system_lookup_dict(b"errordict")
            .and_then(|errordict| errordict.borrow().get(error_name).cloned());

        match handler {
            Some(proc) if proc.executable && !self.handling_error => {
                self.handling_error = true;
                let outcome = self.execute_object(proc);
                self.handling_error = false;
                outcome?;

                self.stop_requested = true;
                self.pending_error.get_or_insert(err);
            }
            _ => {
                self.stop_requested = true;
                self.pending_error = Some(err);
            }
        }

        Ok(())
    }

    fn system_lookup_dict(&self, key: &[u8]) -> Option<DictRef> {
        match self.dicts.system_dict().borrow().get(Name::new(key)) {
            Some(Object {
                value: Value::Dictionary(dict),
                ..
            }) => Some(Rc::clone(dict)),
            _ => None,
        }
    }

    pub(crate) fn current_file(&self) -> Option<crate::file::FileRef> {
        self.parser.lexer.current_file()
    }

    /// `stopped` body: run the object, catch the stop flag
    pub(crate) fn run_stopped(&mut self, obj: Object) -> PsResult<bool> {
        self.execute_object(obj)?;

        if self.stop_requested {
            self.stop_requested = false;
            self.pending_error = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `save`: capture a generation plus the depths restore rolls back to
    pub(crate) fn capture_save(&mut self) -> SaveRecord {
        self.save_generation += 1;

        self.gstate_stack.push(self.gstate.clone());
        self.device.gsave();

        SaveRecord {
            generation: self.save_generation,
            gstate_depth: self.gstate_stack.len(),
            dict_depth: self.dicts.len(),
        }
    }

    pub(crate) fn restore_save(&mut self, record: SaveRecord) -> PsResult<()> {
        if record.gstate_depth > self.gstate_stack.len() || record.generation > self.save_generation
        {
            // the snapshot was already restored past
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        while self.gstate_stack.len() > record.gstate_depth {
            self.gstate_stack.pop();
            self.device.grestore();
        }

        self.gstate = self.gstate_stack.pop().unwrap();
        self.device.grestore();
        self.device.set_ctm(&self.gstate.ctm);

        self.dicts.truncate(record.dict_depth);
        self.save_generation = record.generation - 1;

        Ok(())
    }
}

/// Operand-stack helpers
impl Interpreter {
    pub(crate) fn push(&mut self, obj: Object) -> PsResult<()> {
        if self.operand_stack.len() >= OPERAND_STACK_LIMIT {
            anyhow::bail!(PostScriptError::StackOverflow);
        }

        self.operand_stack.push(obj);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> PsResult<Object> {
        match self.operand_stack.pop() {
            Some(obj) => Ok(obj),
            None => anyhow::bail!(PostScriptError::StackUnderflow),
        }
    }

    pub(crate) fn peek(&self) -> Option<&Object> {
        self.operand_stack.last()
    }

    pub(crate) fn pop_int(&mut self) -> PsResult<i32> {
        self.pop()?.expect_int()
    }

    pub(crate) fn pop_usize(&mut self) -> PsResult<usize> {
        let n = self.pop_int()?;

        match usize::try_from(n) {
            Ok(n) => Ok(n),
            Err(_) => anyhow::bail!(PostScriptError::RangeCheck),
        }
    }

    pub(crate) fn pop_number(&mut self) -> PsResult<f64> {
        self.pop()?.expect_number()
    }

    pub(crate) fn pop_bool(&mut self) -> PsResult<bool> {
        match self.pop()?.value {
            Value::Boolean(b) => Ok(b),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub(crate) fn pop_name(&mut self) -> PsResult<Name> {
        match self.pop()?.value {
            Value::Name(name) => Ok(name),
            Value::String(s) => Ok(Name::new(&s.bytes())),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub(crate) fn pop_string(&mut self) -> PsResult<StringRef> {
        match self.pop()?.value {
            Value::String(s) => Ok(s),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub(crate) fn pop_array(&mut self) -> PsResult<ArrayRef> {
        match self.pop()?.value {
            Value::Array(arr) => Ok(arr),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    /// An executable array
    pub(crate) fn pop_proc(&mut self) -> PsResult<ArrayRef> {
        let obj = self.pop()?;
        let executable = obj.executable;

        match obj.value {
            Value::Array(arr) if executable => Ok(arr),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub(crate) fn pop_dict(&mut self) -> PsResult<DictRef> {
        match self.pop()?.value {
            Value::Dictionary(dict) => Ok(dict),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub(crate) fn pop_file(&mut self) -> PsResult<crate::file::FileRef> {
        match self.pop()?.value {
            Value::File(file) => Ok(file),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    /// A matrix operand: either the matrix variant or a six-number array
    pub(crate) fn pop_matrix(&mut self) -> PsResult<Matrix> {
        let obj = self.pop()?;
        object_to_matrix(&obj)
    }

    /// Write a matrix result back through the operand that asked for it: a
    /// six-number array is filled in place, anything else becomes a matrix
    /// value
    pub(crate) fn store_matrix(&mut self, target: Object, m: Matrix) -> PsResult<()> {
        match target.value {
            Value::Array(arr) => {
                if arr.len() != 6 {
                    anyhow::bail!(PostScriptError::RangeCheck);
                }

                for (i, value) in m.m.iter().enumerate() {
                    arr.put(i, Object::real(*value))?;
                }

                self.push(Object::array(arr))
            }
            _ => self.push(Object::matrix(m)),
        }
    }
}

pub(crate) fn object_to_matrix(obj: &Object) -> PsResult<Matrix> {
    match &obj.value {
        Value::Matrix(m) => Ok(*m),
        Value::Array(arr) => {
            if arr.len() != 6 {
                anyhow::bail!(PostScriptError::RangeCheck);
            }

            let mut m = [0.0; 6];
            for (i, slot) in m.iter_mut().enumerate() {
                *slot = arr.get(i)?.expect_number()?;
            }

            Ok(Matrix { m })
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn interpreter(source: &[u8]) -> (Interpreter, SharedOutput) {
        let out = SharedOutput::default();
        let mut interp = Interpreter::new(source);
        interp.set_output(Box::new(out.clone()));
        (interp, out)
    }

    fn run(source: &[u8]) -> Interpreter {
        let (mut interp, _) = interpreter(source);
        interp.run().unwrap();
        interp
    }

    fn run_output(source: &[u8]) -> String {
        let (mut interp, out) = interpreter(source);
        interp.run().unwrap();
        let bytes = out.0.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn add_and_print() {
        assert_eq!(run_output(b"1 2 add ="), "3\n");
    }

    #[test]
    fn def_then_load_and_print() {
        assert_eq!(run_output(b"/x 42 def x ="), "42\n");
    }

    #[test]
    fn for_loop_prints_each_value() {
        assert_eq!(run_output(b"0 1 3 { = } for"), "0\n1\n2\n3\n");
    }

    #[test]
    fn stopped_catches_stop() {
        assert_eq!(
            run_output(b"{ (before) = stop (after) = } stopped ="),
            "before\ntrue\n"
        );
    }

    #[test]
    fn dict_construction_and_known() {
        assert_eq!(
            run_output(b"<< /a 1 /b 2 >> dup /a known =  /c known ="),
            "true\nfalse\n"
        );
    }

    #[test]
    fn pathbbox_of_closed_triangle() {
        let mut interp =
            run(b"newpath 10 10 moveto 100 10 lineto 100 100 lineto closepath pathbbox");

        assert_eq!(interp.pop_number().unwrap(), 100.0);
        assert_eq!(interp.pop_number().unwrap(), 100.0);
        assert_eq!(interp.pop_number().unwrap(), 10.0);
        assert_eq!(interp.pop_number().unwrap(), 10.0);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn transform_of_origin_through_scaled_ctm() {
        let mut interp = run(b"matrix dup 2 3 scale concatmatrix 0 0 transform");

        assert_eq!(interp.pop_number().unwrap(), 0.0);
        assert_eq!(interp.pop_number().unwrap(), 0.0);
    }

    #[test]
    fn literal_objects_accumulate() {
        let mut interp = run(b"1 2.5 (str) /nm");

        assert!(matches!(interp.pop().unwrap().value, Value::Name(_)));
        assert!(matches!(interp.pop().unwrap().value, Value::String(_)));
        assert_eq!(interp.pop_number().unwrap(), 2.5);
        assert_eq!(interp.pop_int().unwrap(), 1);
    }

    #[test]
    fn procedures_defer_until_executed() {
        let mut interp = run(b"/double { 2 mul } def 21 double");
        assert_eq!(interp.pop_int().unwrap(), 42);
    }

    #[test]
    fn nested_procedure_is_data_until_called() {
        let mut interp = run(b"true { { 1 } } if exec");
        assert_eq!(interp.pop_int().unwrap(), 1);
    }

    #[test]
    fn undefined_name_is_reported() {
        let (mut interp, _) = interpreter(b"no_such_operator");
        let err = interp.run().unwrap_err();

        match err.downcast_ref::<PostScriptError>() {
            Some(PostScriptError::Undefined { key }) => {
                assert_eq!(key.as_bytes(), b"no_such_operator")
            }
            other => panic!("expected undefined, got {:?}", other),
        }
    }

    #[test]
    fn error_is_recorded_in_dollar_error() {
        let (mut interp, _) = interpreter(b"{ 1 0 idiv } stopped pop $error /errorname get ==");
        let out = SharedOutput::default();
        interp.set_output(Box::new(out.clone()));
        interp.run().unwrap();

        let text = String::from_utf8(out.0.borrow().clone()).unwrap();
        assert_eq!(text, "/undefinedresult\n");
    }

    #[test]
    fn failed_operator_leaves_stack_unchanged() {
        // `add` with one operand underflows; the 1 stays
        let (mut interp, _) = interpreter(b"1 add");
        assert!(interp.run().is_err());

        assert_eq!(interp.pop_int().unwrap(), 1);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn exit_unwinds_only_the_nearest_loop() {
        let mut interp = run(b"0 1 1 10 { add dup 3 ge { exit } if } for");
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn executable_string_runs_as_source() {
        let mut interp = run(b"(1 2 add) cvx exec");
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn deep_recursion_does_not_overflow_the_host() {
        // each level pushes a frame; the exec stack limit reports limitcheck
        // instead of crashing
        let (mut interp, _) = interpreter(b"/f { f } def f");
        let err = interp.run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PostScriptError>(),
            Some(PostScriptError::LimitCheck)
        ));
    }

    #[test]
    fn save_restore_rolls_back_graphics_and_dicts() {
        let mut interp = run(
            b"save 10 dict begin /local 1 def 2 setlinewidth restore currentlinewidth countdictstack",
        );

        assert_eq!(interp.pop_int().unwrap(), 2);
        assert_eq!(interp.pop_number().unwrap(), 1.0);
    }

    #[test]
    fn gsave_grestore_parity() {
        let mut interp = run(
            b"1 setlinewidth 0.5 setgray gsave 5 setlinewidth 0 setgray grestore currentlinewidth currentgray",
        );

        assert_eq!(interp.pop_number().unwrap(), 0.5);
        assert_eq!(interp.pop_number().unwrap(), 1.0);
    }

    #[test]
    fn eexec_section_executes_decrypted_source() {
        use crate::eexec;

        let mut plain = b"SALT".to_vec();
        plain.extend_from_slice(b" /secret 99 def ");

        let cipher = eexec::encrypt(&plain, eexec::EEXEC_SEED);

        let mut source = b"eexec ".to_vec();
        for b in cipher {
            source.extend_from_slice(format!("{:02X}", b).as_bytes());
        }
        source.extend_from_slice(b" cleartomark secret");

        let mut interp = run(&source);
        assert_eq!(interp.pop_int().unwrap(), 99);
    }

    #[test]
    fn currentfile_readstring_consumes_program_text() {
        // readstring consumes the bytes following its own call site
        let mut interp = run(b"currentfile 6 string readstring XYZjkl pop");

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"XYZjkl");
    }

    #[test]
    fn quit_stops_the_stream() {
        let mut interp = run(b"1 quit 2");

        assert!(interp.quit_requested());
        assert_eq!(interp.pop_int().unwrap(), 1);
        assert!(interp.pop().is_err());
    }
}
