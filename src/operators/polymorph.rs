//! Element access across composite types: arrays, strings, dictionaries.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    name::Name,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"length", op_length);
    op(dict, b"get", op_get);
    op(dict, b"put", op_put);
    op(dict, b"getinterval", op_getinterval);
    op(dict, b"putinterval", op_putinterval);
}

fn op_length(interp: &mut Interpreter) -> PsResult<()> {
    let len = match interp.pop()?.value {
        Value::Array(arr) => arr.len(),
        Value::String(s) => s.len(),
        Value::Dictionary(dict) => dict.borrow().len(),
        Value::Name(name) => name.len(),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    interp.push(Object::integer(len as i32))
}

fn index_from(obj: Object) -> PsResult<usize> {
    match usize::try_from(obj.expect_int()?) {
        Ok(idx) => Ok(idx),
        Err(_) => anyhow::bail!(PostScriptError::RangeCheck),
    }
}

fn op_get(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.pop()?;
    let container = interp.pop()?;

    match container.value {
        Value::Array(arr) => {
            let value = arr.get(index_from(key)?)?;
            interp.push(value)
        }
        Value::String(s) => {
            let byte = s.get(index_from(key)?)?;
            interp.push(Object::integer(i32::from(byte)))
        }
        Value::Dictionary(dict) => {
            let key = match key.value {
                Value::Name(name) => name,
                Value::String(s) => Name::new(&s.bytes()),
                _ => anyhow::bail!(PostScriptError::TypeCheck),
            };

            let value = match dict.borrow().get(key) {
                Some(value) => value.clone(),
                None => anyhow::bail!(PostScriptError::Undefined { key }),
            };

            interp.push(value)
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_put(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.pop()?;
    let key = interp.pop()?;
    let container = interp.pop()?;

    match container.value {
        Value::Array(arr) => arr.put(index_from(key)?, value),
        Value::String(s) => {
            let byte = match u8::try_from(value.expect_int()?) {
                Ok(byte) => byte,
                Err(_) => anyhow::bail!(PostScriptError::RangeCheck),
            };

            s.put(index_from(key)?, byte)
        }
        Value::Dictionary(dict) => {
            if !dict.borrow().access().writable() {
                anyhow::bail!(PostScriptError::InvalidAccess);
            }

            let key = match key.value {
                Value::Name(name) => name,
                Value::String(s) => Name::new(&s.bytes()),
                _ => anyhow::bail!(PostScriptError::TypeCheck),
            };

            dict.borrow_mut().insert(key, value);
            Ok(())
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

/// The result shares storage with the operand; writes through either are
/// visible through both
fn op_getinterval(interp: &mut Interpreter) -> PsResult<()> {
    let count = interp.pop_usize()?;
    let index = interp.pop_usize()?;

    match interp.pop()?.value {
        Value::Array(arr) => {
            let view = arr.getinterval(index, count)?;
            interp.push(Object::array(view))
        }
        Value::String(s) => {
            let view = s.getinterval(index, count)?;
            interp.push(Object::string(view))
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_putinterval(interp: &mut Interpreter) -> PsResult<()> {
    let source = interp.pop()?;
    let index = interp.pop_usize()?;
    let target = interp.pop()?;

    match (target.value, source.value) {
        (Value::Array(dst), Value::Array(src)) => dst.putinterval(index, &src),
        (Value::String(dst), Value::String(src)) => dst.putinterval(index, &src),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
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
    fn get_and_put_on_each_container() {
        let mut interp = run(b"[1 2 3] dup 1 99 put 1 get");
        assert_eq!(interp.pop_int().unwrap(), 99);

        let mut interp = run(b"(abc) dup 0 88 put 0 get");
        assert_eq!(interp.pop_int().unwrap(), 88);

        let mut interp = run(b"3 dict dup /k 7 put /k get");
        assert_eq!(interp.pop_int().unwrap(), 7);
    }

    #[test]
    fn get_out_of_range_fails() {
        let mut interp = Interpreter::new(b"[1] 5 get");
        assert!(interp.run().is_err());
    }

    #[test]
    fn get_of_missing_dict_key_is_undefined() {
        let mut interp = Interpreter::new(b"1 dict /missing get");
        assert!(interp.run().is_err());
    }

    #[test]
    fn length_of_each_type() {
        let mut interp = run(b"[1 2] length (abcd) length 2 dict length /name length");

        assert_eq!(interp.pop_int().unwrap(), 4);
        assert_eq!(interp.pop_int().unwrap(), 0);
        assert_eq!(interp.pop_int().unwrap(), 4);
        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn interval_views_share_storage() {
        let mut interp = run(b"/s (abcdef) def s 1 3 getinterval 0 88 put s");

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"aXcdef");
    }

    #[test]
    fn putinterval_copies_across() {
        let mut interp = run(b"(abcdef) dup 2 (XY) putinterval");

        let s = interp.pop_string().unwrap();
        assert_eq!(s.bytes(), b"abXYef");
    }
}
