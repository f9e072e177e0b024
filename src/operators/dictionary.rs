//! Dictionary and dictionary-stack operators.

use std::rc::Rc;

use crate::{
    dictionary::{new_dict_ref, Dictionary},
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"dict", op_dict);
    op(dict, b"begin", op_begin);
    op(dict, b"end", op_end);
    op(dict, b"def", op_def);
    op(dict, b"store", op_store);
    op(dict, b"load", op_load);
    op(dict, b"where", op_where);
    op(dict, b"known", op_known);
    op(dict, b"undef", op_undef);
    op(dict, b"maxlength", op_maxlength);
    op(dict, b"currentdict", op_currentdict);
    op(dict, b"countdictstack", op_countdictstack);
    op(dict, b"cleardictstack", op_cleardictstack);
    op(dict, b"dictstack", op_dictstack);
    op(dict, b">>", op_dict_from_mark);
}

fn op_dict(interp: &mut Interpreter) -> PsResult<()> {
    let capacity = interp.pop_usize()?;

    interp.push(Object::dictionary(new_dict_ref(Dictionary::with_capacity(
        capacity,
    ))))
}

fn op_begin(interp: &mut Interpreter) -> PsResult<()> {
    let dict = interp.pop_dict()?;

    interp.dicts.begin(dict);

    Ok(())
}

fn op_end(interp: &mut Interpreter) -> PsResult<()> {
    interp.dicts.end()
}

/// key value `def` — associates key with value in the current dictionary.
/// If key is already present, def simply replaces its value.
fn op_def(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.pop()?;
    let key = interp.pop_name()?;

    interp.dicts.def(key, value);

    Ok(())
}

/// Like def, but replaces the value in the first dictionary that already
/// defines key
fn op_store(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.pop()?;
    let key = interp.pop_name()?;

    interp.dicts.store(key, value);

    Ok(())
}

fn op_load(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop_name()?;

    let value = interp.dicts.load(key)?;
    interp.push(value)
}

/// key `where` — (dict true) when some dictionary on the stack defines key,
/// false otherwise
fn op_where(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop_name()?;

    match interp.dicts.where_defined(key) {
        Some(dict) => {
            interp.push(Object::dictionary(dict))?;
            interp.push(Object::boolean(true))
        }
        None => interp.push(Object::boolean(false)),
    }
}

/// dict key `known` — the dictionary does not have to be on the stack
fn op_known(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop_name()?;
    let dict = interp.pop_dict()?;

    let known = dict.borrow().contains(key);
    interp.push(Object::boolean(known))
}

fn op_undef(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop_name()?;
    let dict = interp.pop_dict()?;

    dict.borrow_mut().remove(key);

    Ok(())
}

fn op_maxlength(interp: &mut Interpreter) -> PsResult<()> {
    let dict = interp.pop_dict()?;

    let capacity = dict.borrow().capacity();
    interp.push(Object::integer(capacity as i32))
}

fn op_currentdict(interp: &mut Interpreter) -> PsResult<()> {
    let current = interp.dicts.current();

    interp.push(Object::dictionary(current))
}

fn op_countdictstack(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::integer(interp.dicts.len() as i32))
}

fn op_cleardictstack(interp: &mut Interpreter) -> PsResult<()> {
    interp.dicts.clear_to_permanent();

    Ok(())
}

/// The whole dictionary stack as an array, bottom first
fn op_dictstack(interp: &mut Interpreter) -> PsResult<()> {
    let dicts: Vec<Object> = interp
        .dicts
        .snapshot()
        .into_iter()
        .map(Object::dictionary)
        .collect();

    interp.push(Object::array(crate::object::ArrayRef::from_objects(dicts)))
}

/// `>>` — pop key/value pairs back to the matching mark and build a
/// dictionary
fn op_dict_from_mark(interp: &mut Interpreter) -> PsResult<()> {
    let mut entries = Vec::new();

    loop {
        match interp.operand_stack.pop() {
            Some(obj) if obj.is_mark() => break,
            Some(obj) => entries.push(obj),
            None => anyhow::bail!(PostScriptError::UnmatchedMark),
        }
    }

    if entries.len() % 2 != 0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    entries.reverse();

    let dict = new_dict_ref(Dictionary::with_capacity(entries.len() / 2));

    for pair in entries.chunks(2) {
        let key = match &pair[0].value {
            Value::Name(name) => *name,
            Value::String(s) => crate::name::Name::new(&s.bytes()),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        };

        dict.borrow_mut().insert(key, pair[1].clone());
    }

    interp.push(Object::dictionary(Rc::clone(&dict)))
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
    fn def_into_nested_dict_is_scoped() {
        let mut interp = run(b"5 dict begin /x 1 def x end");
        assert_eq!(interp.pop_int().unwrap(), 1);

        let mut interp = Interpreter::new(b"5 dict begin /x 1 def end x");
        assert!(interp.run().is_err());
    }

    #[test]
    fn store_writes_through_to_the_defining_dict() {
        let mut interp = run(
            b"/x 1 def 5 dict begin x 2 add /x exch store end x",
        );
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn where_finds_the_defining_dictionary() {
        let mut interp = run(b"/v 9 def /v where { /v get } { 0 } ifelse");
        assert_eq!(interp.pop_int().unwrap(), 9);

        let mut interp = run(b"/absent where");
        assert!(!interp.pop_bool().unwrap());
    }

    #[test]
    fn known_does_not_require_the_stack() {
        let mut interp = run(b"/d 3 dict def d /k 1 put d /k known d /other known");

        assert!(!interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn maxlength_reports_capacity() {
        let mut interp = run(b"20 dict maxlength");
        assert!(interp.pop_int().unwrap() >= 20);
    }

    #[test]
    fn double_angle_literal_builds_a_dict() {
        let mut interp = run(b"<< /a 1 /b (two) >> dup length exch /a get");

        assert_eq!(interp.pop_int().unwrap(), 1);
        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn end_cannot_pop_userdict() {
        let mut interp = Interpreter::new(b"end");
        assert!(interp.run().is_err());
    }

    #[test]
    fn countdictstack_grows_with_begin() {
        let mut interp = run(b"countdictstack 3 dict begin countdictstack end");

        assert_eq!(interp.pop_int().unwrap(), 3);
        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn undef_removes_an_entry() {
        let mut interp = run(b"/d 3 dict def d /k 1 put d /k undef d /k known");
        assert!(!interp.pop_bool().unwrap());
    }
}
