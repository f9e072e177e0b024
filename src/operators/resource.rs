//! Resource operators.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"defineresource", op_defineresource);
    op(dict, b"undefineresource", op_undefineresource);
    op(dict, b"findresource", op_findresource);
    op(dict, b"resourcestatus", op_resourcestatus);
    op(dict, b"resourceforall", op_resourceforall);
}

/// key instance category `defineresource` instance
fn op_defineresource(interp: &mut Interpreter) -> PsResult<()> {
    let category = interp.pop_name()?;
    let instance = interp.pop()?;
    let key = interp.pop_name()?;

    interp.resources.define(category, key, instance.clone());

    interp.push(instance)
}

fn op_undefineresource(interp: &mut Interpreter) -> PsResult<()> {
    let category = interp.pop_name()?;
    let key = interp.pop_name()?;

    interp.resources.undefine(category, key)
}

fn op_findresource(interp: &mut Interpreter) -> PsResult<()> {
    let category = interp.pop_name()?;
    let key = interp.pop_name()?;

    match interp.resources.find(category, key) {
        Some(instance) => interp.push(instance),
        None => anyhow::bail!(PostScriptError::Undefined { key }),
    }
}

/// key category `resourcestatus` status size true, or false
fn op_resourcestatus(interp: &mut Interpreter) -> PsResult<()> {
    let category = interp.pop_name()?;
    let key = interp.pop_name()?;

    if interp.resources.status(category, key) {
        interp.push(Object::integer(0))?;
        interp.push(Object::integer(0))?;
        interp.push(Object::boolean(true))
    } else {
        interp.push(Object::boolean(false))
    }
}

/// template proc scratch category `resourceforall` — run proc once per
/// instance key, the key written into the scratch string
fn op_resourceforall(interp: &mut Interpreter) -> PsResult<()> {
    let category = interp.pop_name()?;
    let scratch = interp.pop_string()?;
    let proc = interp.pop_proc()?;
    let template = interp.pop()?;

    let prefix = match &template.value {
        Value::String(s) => s.bytes(),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    for (key, _) in interp.resources.all_instances(category) {
        if !key.as_bytes().starts_with(&prefix) {
            continue;
        }

        let bytes = key.as_bytes();

        if bytes.len() > scratch.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        for (i, &b) in bytes.iter().enumerate() {
            scratch.put(i, b)?;
        }

        interp.push(Object::string(scratch.truncated(bytes.len())))?;
        interp.execute_proc(&proc)?;

        if interp.exit_requested {
            interp.exit_requested = false;
            break;
        }

        if interp.stop_requested || interp.quit_requested {
            break;
        }
    }

    Ok(())
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
    fn define_then_find() {
        let mut interp = run(b"/key1 42 /Widget defineresource pop /key1 /Widget findresource");
        assert_eq!(interp.pop_int().unwrap(), 42);
    }

    #[test]
    fn missing_resource_is_undefined() {
        let mut interp = Interpreter::new(b"/nothing /Widget findresource");
        assert!(interp.run().is_err());
    }

    #[test]
    fn resourcestatus_reports_presence() {
        let mut interp = run(
            b"/key1 1 /Widget defineresource pop \
              /key1 /Widget resourcestatus \
              /other /Widget resourcestatus",
        );

        assert!(!interp.pop_bool().unwrap());
        assert!(interp.pop_bool().unwrap());
        assert_eq!(interp.pop_int().unwrap(), 0);
        assert_eq!(interp.pop_int().unwrap(), 0);
    }

    #[test]
    fn resourceforall_visits_matching_keys() {
        let mut interp = run(
            b"/aa 1 /Widget defineresource pop \
              /ab 2 /Widget defineresource pop \
              /zz 3 /Widget defineresource pop \
              0 (a) { pop 1 add } 8 string /Widget resourceforall",
        );

        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn undefineresource_removes() {
        let mut interp = Interpreter::new(
            b"/k 1 /Widget defineresource pop /k /Widget undefineresource /k /Widget findresource",
        );
        assert!(interp.run().is_err());
    }
}
