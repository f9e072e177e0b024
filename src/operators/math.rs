//! Arithmetic and the random number generator.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"add", op_add);
    op(dict, b"sub", op_sub);
    op(dict, b"mul", op_mul);
    op(dict, b"div", op_div);
    op(dict, b"idiv", op_idiv);
    op(dict, b"mod", op_mod);
    op(dict, b"neg", op_neg);
    op(dict, b"abs", op_abs);
    op(dict, b"sqrt", op_sqrt);
    op(dict, b"ceiling", op_ceiling);
    op(dict, b"floor", op_floor);
    op(dict, b"round", op_round);
    op(dict, b"truncate", op_truncate);
    op(dict, b"exp", op_exp);
    op(dict, b"ln", op_ln);
    op(dict, b"log", op_log);
    op(dict, b"sin", op_sin);
    op(dict, b"cos", op_cos);
    op(dict, b"atan", op_atan);
    op(dict, b"min", op_min);
    op(dict, b"max", op_max);
    op(dict, b"rand", op_rand);
    op(dict, b"srand", op_srand);
    op(dict, b"rrand", op_rrand);
}

/// Integer operands give an integer result while it fits; overflow demotes
/// to real
fn arith(
    interp: &mut Interpreter,
    checked: impl Fn(i32, i32) -> Option<i32>,
    real: impl Fn(f64, f64) -> f64,
) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    if let (Value::Integer(a), Value::Integer(b)) = (&a.value, &b.value) {
        return match checked(*a, *b) {
            Some(n) => interp.push(Object::integer(n)),
            None => interp.push(Object::real(real(f64::from(*a), f64::from(*b)))),
        };
    }

    let a = a.expect_number()?;
    let b = b.expect_number()?;

    interp.push(Object::real(real(a, b)))
}

fn op_add(interp: &mut Interpreter) -> PsResult<()> {
    arith(interp, i32::checked_add, |a, b| a + b)
}

fn op_sub(interp: &mut Interpreter) -> PsResult<()> {
    arith(interp, i32::checked_sub, |a, b| a - b)
}

fn op_mul(interp: &mut Interpreter) -> PsResult<()> {
    arith(interp, i32::checked_mul, |a, b| a * b)
}

/// Always a real quotient, even for integer operands
fn op_div(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop_number()?;
    let a = interp.pop_number()?;

    if b == 0.0 {
        anyhow::bail!(PostScriptError::UndefinedResult);
    }

    interp.push(Object::real(a / b))
}

fn op_idiv(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop_int()?;
    let a = interp.pop_int()?;

    if b == 0 {
        anyhow::bail!(PostScriptError::UndefinedResult);
    }

    interp.push(Object::integer(a.wrapping_div(b)))
}

fn op_mod(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop_int()?;
    let a = interp.pop_int()?;

    if b == 0 {
        anyhow::bail!(PostScriptError::UndefinedResult);
    }

    interp.push(Object::integer(a.wrapping_rem(b)))
}

fn unary_preserving(
    interp: &mut Interpreter,
    int_case: impl Fn(i32) -> Option<i32>,
    real_case: impl Fn(f64) -> f64,
) -> PsResult<()> {
    match interp.pop()?.value {
        Value::Integer(n) => match int_case(n) {
            Some(result) => interp.push(Object::integer(result)),
            None => interp.push(Object::real(real_case(f64::from(n)))),
        },
        Value::Real(f) => interp.push(Object::real(real_case(f))),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_neg(interp: &mut Interpreter) -> PsResult<()> {
    unary_preserving(interp, i32::checked_neg, |f| -f)
}

fn op_abs(interp: &mut Interpreter) -> PsResult<()> {
    unary_preserving(interp, i32::checked_abs, f64::abs)
}

fn op_sqrt(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.pop_number()?;

    if n < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.push(Object::real(n.sqrt()))
}

/// The type of the result matches the type of the operand
fn rounding(interp: &mut Interpreter, f: impl Fn(f64) -> f64) -> PsResult<()> {
    match interp.pop()?.value {
        Value::Integer(n) => interp.push(Object::integer(n)),
        Value::Real(x) => interp.push(Object::real(f(x))),
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_ceiling(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::ceil)
}

fn op_floor(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::floor)
}

fn op_round(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::round)
}

fn op_truncate(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::trunc)
}

/// base exponent `exp` — always real
fn op_exp(interp: &mut Interpreter) -> PsResult<()> {
    let exponent = interp.pop_number()?;
    let base = interp.pop_number()?;

    interp.push(Object::real(base.powf(exponent)))
}

fn op_ln(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.pop_number()?;

    if n <= 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.push(Object::real(n.ln()))
}

fn op_log(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.pop_number()?;

    if n <= 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.push(Object::real(n.log10()))
}

fn op_sin(interp: &mut Interpreter) -> PsResult<()> {
    let degrees = interp.pop_number()?;

    interp.push(Object::real(degrees.to_radians().sin()))
}

fn op_cos(interp: &mut Interpreter) -> PsResult<()> {
    let degrees = interp.pop_number()?;

    interp.push(Object::real(degrees.to_radians().cos()))
}

/// num den `atan` — degrees in 0..360
fn op_atan(interp: &mut Interpreter) -> PsResult<()> {
    let den = interp.pop_number()?;
    let num = interp.pop_number()?;

    if num == 0.0 && den == 0.0 {
        anyhow::bail!(PostScriptError::UndefinedResult);
    }

    let mut degrees = num.atan2(den).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }

    interp.push(Object::real(degrees))
}

fn extremum(interp: &mut Interpreter, pick_first: impl Fn(f64, f64) -> bool) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    let keep_a = pick_first(a.expect_number()?, b.expect_number()?);

    interp.push(if keep_a { a } else { b })
}

fn op_min(interp: &mut Interpreter) -> PsResult<()> {
    extremum(interp, |a, b| a <= b)
}

fn op_max(interp: &mut Interpreter) -> PsResult<()> {
    extremum(interp, |a, b| a >= b)
}

// the classic linear-congruential generator
const RAND_MULTIPLIER: u64 = 1103515245;
const RAND_INCREMENT: u64 = 12345;
const RAND_MASK: u64 = 0x7FFF_FFFF;

fn op_rand(interp: &mut Interpreter) -> PsResult<()> {
    let next = (RAND_MULTIPLIER * u64::from(interp.rand_state) + RAND_INCREMENT) & RAND_MASK;
    interp.rand_state = next as u32;

    interp.push(Object::integer(next as i32))
}

fn op_srand(interp: &mut Interpreter) -> PsResult<()> {
    let seed = interp.pop_int()?;
    interp.rand_state = (seed as u32) & (RAND_MASK as u32);

    Ok(())
}

/// The value `srand` would have to be given to reproduce the sequence
fn op_rrand(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::integer(interp.rand_state as i32))
}

#[cfg(test)]
mod test {
    use crate::{interpreter::Interpreter, object::Value};

    fn run(source: &[u8]) -> Interpreter {
        let mut interp = Interpreter::new(source);
        interp.run().unwrap();
        interp
    }

    #[test]
    fn integer_ops_stay_integer() {
        let mut interp = run(b"3 4 add 2 sub 5 mul");

        assert!(matches!(interp.pop().unwrap().value, Value::Integer(25)));
    }

    #[test]
    fn mixed_operands_produce_real() {
        let mut interp = run(b"1 2.0 add");
        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == 3.0));
    }

    #[test]
    fn overflow_demotes_to_real() {
        let mut interp = run(b"2147483647 1 add");
        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == 2147483648.0));
    }

    #[test]
    fn div_is_always_real() {
        let mut interp = run(b"6 2 div");
        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == 3.0));
    }

    #[test]
    fn idiv_and_mod_are_integer_only() {
        let mut interp = run(b"7 2 idiv 7 2 mod");

        assert_eq!(interp.pop_int().unwrap(), 1);
        assert_eq!(interp.pop_int().unwrap(), 3);

        let mut interp = Interpreter::new(b"7.0 2 idiv");
        assert!(interp.run().is_err());

        let mut interp = Interpreter::new(b"7 0 idiv");
        assert!(interp.run().is_err());
    }

    #[test]
    fn rounding_preserves_operand_type() {
        let mut interp = run(b"3 ceiling 3.2 ceiling -3.2 truncate 2.5 round");

        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == 3.0));
        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == -3.0));
        assert!(matches!(interp.pop().unwrap().value, Value::Real(f) if f == 4.0));
        assert!(matches!(interp.pop().unwrap().value, Value::Integer(3)));
    }

    #[test]
    fn trig_works_in_degrees() {
        let mut interp = run(b"90 sin 0 cos");

        assert!((interp.pop_number().unwrap() - 1.0).abs() < 1e-12);
        assert!((interp.pop_number().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn atan_normalizes_to_positive_degrees() {
        let mut interp = run(b"-1 0 atan");
        assert!((interp.pop_number().unwrap() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn min_max_keep_operand_type() {
        let mut interp = run(b"3 4 min 3 4 max");

        assert!(matches!(interp.pop().unwrap().value, Value::Integer(4)));
        assert!(matches!(interp.pop().unwrap().value, Value::Integer(3)));
    }

    #[test]
    fn rand_is_deterministic_from_seed() {
        let mut a = run(b"42 srand rand rand rand");
        let mut b = run(b"42 srand rand rand rand");

        for _ in 0..3 {
            assert_eq!(a.pop_int().unwrap(), b.pop_int().unwrap());
        }
    }

    #[test]
    fn rrand_reports_the_reseedable_state() {
        let mut interp = run(b"7 srand rand pop rrand srand rand  7 srand rand pop rand");

        let replayed = interp.pop_int().unwrap();
        let original = interp.pop_int().unwrap();
        assert_eq!(replayed, original);
    }

    #[test]
    fn sqrt_of_negative_is_a_rangecheck() {
        let mut interp = Interpreter::new(b"-1 sqrt");
        assert!(interp.run().is_err());
    }
}
