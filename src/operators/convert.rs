//! Type conversion and inspection.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    name::Name,
    object::{Access, Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"cvi", op_cvi);
    op(dict, b"cvr", op_cvr);
    op(dict, b"cvx", op_cvx);
    op(dict, b"cvlit", op_cvlit);
    op(dict, b"xcheck", op_xcheck);
    op(dict, b"type", op_type);
    op(dict, b"readonly", op_readonly);
    op(dict, b"executeonly", op_executeonly);
    op(dict, b"noaccess", op_noaccess);
    op(dict, b"rcheck", op_rcheck);
    op(dict, b"wcheck", op_wcheck);
}

fn numeric_text(s: &crate::object::StringRef) -> PsResult<f64> {
    let bytes = s.bytes();
    let text = std::str::from_utf8(&bytes).map_err(|_| PostScriptError::SyntaxError)?;

    match text.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => anyhow::bail!(PostScriptError::SyntaxError),
    }
}

/// Truncates toward zero
fn op_cvi(interp: &mut Interpreter) -> PsResult<()> {
    let value = match interp.pop()?.value {
        Value::Integer(n) => f64::from(n),
        Value::Real(f) => f,
        Value::String(s) => numeric_text(&s)?,
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    let truncated = value.trunc();

    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.push(Object::integer(truncated as i32))
}

fn op_cvr(interp: &mut Interpreter) -> PsResult<()> {
    let value = match interp.pop()?.value {
        Value::Integer(n) => f64::from(n),
        Value::Real(f) => f,
        Value::String(s) => numeric_text(&s)?,
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    interp.push(Object::real(value))
}

/// Makes the top object executable
fn op_cvx(interp: &mut Interpreter) -> PsResult<()> {
    let mut obj = interp.pop()?;
    obj.executable = true;

    if let Value::Array(arr) = &obj.value {
        arr.set_procedure(true);
    }

    interp.push(obj)
}

fn op_cvlit(interp: &mut Interpreter) -> PsResult<()> {
    let mut obj = interp.pop()?;
    obj.executable = false;

    interp.push(obj)
}

fn op_xcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    interp.push(Object::boolean(obj.executable))
}

fn op_type(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    interp.push(Object::literal_name(Name::new(obj.type_name())))
}

/// Restrict access on a composite object; simple objects pass through
fn modify_access(interp: &mut Interpreter, access: Access) -> PsResult<()> {
    let obj = interp.pop()?;

    match &obj.value {
        Value::Dictionary(dict) => dict.borrow_mut().set_access(access),
        Value::Array(arr) => arr.set_access(access),
        Value::String(s) => s.set_access(access),
        _ => {}
    }

    interp.push(obj)
}

fn op_readonly(interp: &mut Interpreter) -> PsResult<()> {
    modify_access(interp, Access::ReadOnly)
}

fn op_executeonly(interp: &mut Interpreter) -> PsResult<()> {
    modify_access(interp, Access::ExecuteOnly)
}

fn op_noaccess(interp: &mut Interpreter) -> PsResult<()> {
    modify_access(interp, Access::None)
}

fn access_of(obj: &Object) -> Access {
    match &obj.value {
        Value::Dictionary(dict) => dict.borrow().access(),
        Value::Array(arr) => arr.access(),
        Value::String(s) => s.access(),
        _ => Access::Unlimited,
    }
}

fn op_rcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let readable = matches!(access_of(&obj), Access::Unlimited | Access::ReadOnly);
    interp.push(Object::boolean(readable))
}

fn op_wcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let writable = access_of(&obj).writable();
    interp.push(Object::boolean(writable))
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
    fn cvi_truncates_toward_zero() {
        let mut interp = run(b"3.7 cvi -3.7 cvi (42) cvi");

        assert_eq!(interp.pop_int().unwrap(), 42);
        assert_eq!(interp.pop_int().unwrap(), -3);
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn cvi_out_of_range_fails() {
        let mut interp = Interpreter::new(b"1e10 cvi");
        assert!(interp.run().is_err());
    }

    #[test]
    fn cvr_parses_strings() {
        let mut interp = run(b"(2.5) cvr 1 cvr");

        assert_eq!(interp.pop_number().unwrap(), 1.0);
        assert_eq!(interp.pop_number().unwrap(), 2.5);
    }

    #[test]
    fn cvx_cvlit_flip_the_bit() {
        let mut interp = run(b"/x cvx xcheck  { 1 } cvlit xcheck");

        assert!(!interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn readonly_blocks_writes() {
        let mut interp = Interpreter::new(b"[1 2 3] readonly 0 9 put");
        assert!(interp.run().is_err());
    }

    #[test]
    fn access_checks_report() {
        let mut interp = run(b"[1 2 3] readonly rcheck  (s) noaccess wcheck");

        assert!(!interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
    }

    #[test]
    fn type_names() {
        let mut interp = run(b"1 type 1.0 type (s) type /n type [1] type 2 dict type mark type");

        let expected: [&[u8]; 7] = [
            b"marktype",
            b"dicttype",
            b"arraytype",
            b"nametype",
            b"stringtype",
            b"realtype",
            b"integertype",
        ];

        for want in expected {
            assert_eq!(interp.pop_name().unwrap().as_bytes(), want);
        }
    }
}
