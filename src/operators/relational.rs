//! Comparison and boolean/bitwise operators.

use std::cmp::Ordering;

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"eq", op_eq);
    op(dict, b"ne", op_ne);
    op(dict, b"gt", op_gt);
    op(dict, b"ge", op_ge);
    op(dict, b"lt", op_lt);
    op(dict, b"le", op_le);
    op(dict, b"and", op_and);
    op(dict, b"or", op_or);
    op(dict, b"xor", op_xor);
    op(dict, b"not", op_not);
}

fn op_eq(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    interp.push(Object::boolean(a.ps_eq(&b)))
}

fn op_ne(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    interp.push(Object::boolean(!a.ps_eq(&b)))
}

/// Numbers compare by value; strings and names compare lexically, byte by
/// byte. Anything else is a typecheck.
fn ordering(a: &Object, b: &Object) -> PsResult<Ordering> {
    if a.is_number() && b.is_number() {
        let a = a.expect_number()?;
        let b = b.expect_number()?;

        return match a.partial_cmp(&b) {
            Some(ord) => Ok(ord),
            None => anyhow::bail!(PostScriptError::UndefinedResult),
        };
    }

    let bytes_of = |obj: &Object| -> Option<Vec<u8>> {
        match &obj.value {
            Value::String(s) => Some(s.bytes()),
            Value::Name(n) => Some(n.as_bytes().to_vec()),
            _ => None,
        }
    };

    match (bytes_of(a), bytes_of(b)) {
        (Some(a), Some(b)) => Ok(a.cmp(&b)),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn compare(interp: &mut Interpreter, accept: impl Fn(Ordering) -> bool) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    interp.push(Object::boolean(accept(ordering(&a, &b)?)))
}

fn op_gt(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, Ordering::is_gt)
}

fn op_ge(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, Ordering::is_ge)
}

fn op_lt(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, Ordering::is_lt)
}

fn op_le(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, Ordering::is_le)
}

/// Logical on booleans, bitwise on integers
fn bitwise(
    interp: &mut Interpreter,
    logical: impl Fn(bool, bool) -> bool,
    bits: impl Fn(i32, i32) -> i32,
) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    match (&a.value, &b.value) {
        (Value::Boolean(a), Value::Boolean(b)) => interp.push(Object::boolean(logical(*a, *b))),
        (Value::Integer(a), Value::Integer(b)) => interp.push(Object::integer(bits(*a, *b))),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_and(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a && b, |a, b| a & b)
}

fn op_or(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a || b, |a, b| a | b)
}

fn op_xor(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a != b, |a, b| a ^ b)
}

fn op_not(interp: &mut Interpreter) -> PsResult<()> {
    match interp.pop()?.value {
        Value::Boolean(b) => interp.push(Object::boolean(!b)),
        Value::Integer(n) => interp.push(Object::integer(!n)),
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
    fn numeric_comparison_crosses_types() {
        let mut interp = run(b"1 1.0 eq  2 3 lt  3.5 3 gt");

        assert!(interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn strings_compare_lexically() {
        let mut interp = run(b"(abc) (abd) lt  (b) (a) ge");

        assert!(interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn string_and_name_compare_freely() {
        let mut interp = run(b"(abc) /abc eq");
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn booleans_are_logical_integers_bitwise() {
        let mut interp = run(b"true false or  12 10 and  12 10 xor  true not  5 not");

        assert_eq!(interp.pop_int().unwrap(), !5);
        assert!(!interp.pop_bool().unwrap());
        assert_eq!(interp.pop_int().unwrap(), 6);
        assert_eq!(interp.pop_int().unwrap(), 8);
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn comparing_number_with_string_typechecks() {
        let mut interp = Interpreter::new(b"1 (a) lt");
        assert!(interp.run().is_err());
    }
}
