use crate::{
    ast::{Ast, NodeId},
    error::EvalError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator},
            mathml,
        },
        value::{
            core::{RetList, Value},
            multiarray::MultiArray,
            real::MathContext,
            scalar::Scalar,
        },
    },
};

use std::collections::HashMap;

/// An argument handed to a host-supplied function: evaluated, or deferred
/// as the raw node when the entry's evaluation mask says so.
pub enum Argument {
    /// An eagerly evaluated argument.
    Value(Value),
    /// An argument passed through unevaluated.
    Deferred(NodeId),
}

/// A unary base function.
pub type UnaryFn = fn(&MathContext, &Value, usize) -> EvalResult<Value>;
/// A binary base function.
pub type BinaryFn = fn(&MathContext, &Value, &Value, usize) -> EvalResult<Value>;
/// A variadic base function with evaluator access.
pub type VariadicFn = fn(&mut Evaluator, &[Value], usize) -> EvalResult<Value>;
/// A scalar function lifted element-wise over a single array argument.
pub type MapperFn = fn(&MathContext, &Scalar, usize) -> EvalResult<Value>;
/// A host-supplied function with a per-argument lazy-evaluation mask.
pub type ExternalFn = fn(&mut Evaluator, &Ast, &[Argument], usize) -> EvalResult<Value>;
/// A decorative MathML renderer for one base function.
pub type MathMLFn = fn(&Evaluator, &Ast, &[NodeId]) -> EvalResult<String>;

/// The implementation shape of a base-function entry.
#[derive(Clone)]
pub enum FunctionKind {
    /// A built-in taking exactly one evaluated argument.
    Unary(UnaryFn),
    /// A built-in taking exactly two evaluated arguments.
    Binary(BinaryFn),
    /// A built-in taking any number of evaluated arguments.
    Variadic(VariadicFn),
    /// A scalar built-in lifted element-wise over a single array argument.
    Mapper(MapperFn),
    /// A host-supplied function with a lazy-evaluation mask.
    External {
        /// `true` marks an eagerly evaluated position; missing positions
        /// are eager.
        ev_mask: Vec<bool>,
        /// The implementation.
        func:    ExternalFn,
    },
}

/// One entry of the base function table.
#[derive(Clone)]
pub struct FunctionEntry {
    /// The implementation and its calling convention.
    pub kind:   FunctionKind,
    /// The decorative MathML renderer, when one exists.
    pub mathml: Option<MathMLFn>,
}

/// Defines a mapper over a context-taking scalar method.
macro_rules! ctx_mapper {
    ($fname:ident, $method:ident) => {
        fn $fname(ctx: &MathContext, s: &Scalar, _line: usize) -> EvalResult<Value> {
            Ok(Value::Scalar(s.$method(ctx)))
        }
    };
}

/// Defines a mapper over a context-free scalar method.
macro_rules! plain_mapper {
    ($fname:ident, $method:ident) => {
        fn $fname(_ctx: &MathContext, s: &Scalar, _line: usize) -> EvalResult<Value> {
            Ok(Value::Scalar(s.$method()))
        }
    };
}

ctx_mapper!(abs_fn, abs);
ctx_mapper!(arg_fn, arg);
ctx_mapper!(sign_fn, sign);
ctx_mapper!(sqrt_fn, sqrt);
ctx_mapper!(exp_fn, exp);
ctx_mapper!(log_fn, ln);
ctx_mapper!(log10_fn, log10);
ctx_mapper!(gamma_fn, gamma);
ctx_mapper!(sin_fn, sin);
ctx_mapper!(cos_fn, cos);
ctx_mapper!(tan_fn, tan);
ctx_mapper!(csc_fn, csc);
ctx_mapper!(sec_fn, sec);
ctx_mapper!(cot_fn, cot);
ctx_mapper!(asin_fn, asin);
ctx_mapper!(acos_fn, acos);
ctx_mapper!(atan_fn, atan);
ctx_mapper!(acsc_fn, acsc);
ctx_mapper!(asec_fn, asec);
ctx_mapper!(acot_fn, acot);
ctx_mapper!(sinh_fn, sinh);
ctx_mapper!(cosh_fn, cosh);
ctx_mapper!(tanh_fn, tanh);
ctx_mapper!(csch_fn, csch);
ctx_mapper!(sech_fn, sech);
ctx_mapper!(coth_fn, coth);
ctx_mapper!(asinh_fn, asinh);
ctx_mapper!(acosh_fn, acosh);
ctx_mapper!(atanh_fn, atanh);
ctx_mapper!(acsch_fn, acsch);
ctx_mapper!(asech_fn, asech);
ctx_mapper!(acoth_fn, acoth);
plain_mapper!(conj_fn, conj);
plain_mapper!(floor_fn, floor);
plain_mapper!(ceil_fn, ceil);
plain_mapper!(round_fn, round);
plain_mapper!(fix_fn, fix);

fn real_fn(_ctx: &MathContext, s: &Scalar, _line: usize) -> EvalResult<Value> {
    Ok(Value::Scalar(Scalar::real(s.re.clone())))
}

fn imag_fn(_ctx: &MathContext, s: &Scalar, _line: usize) -> EvalResult<Value> {
    Ok(Value::Scalar(Scalar::real(s.im.clone())))
}

fn factorial_fn(ctx: &MathContext, s: &Scalar, line: usize) -> EvalResult<Value> {
    s.factorial(ctx)
     .map(Value::Scalar)
     .ok_or(EvalError::FactorialDomain { line })
}

fn logb_fn(ctx: &MathContext, base: &Value, x: &Value, line: usize) -> EvalResult<Value> {
    let (Value::Scalar(base), Value::Scalar(x)) = (base, x) else {
        return Err(EvalError::TypeMismatch { details: "'logb' takes scalar arguments".to_string(),
                                             line });
    };
    Ok(Value::Scalar(x.logb(base, ctx)))
}

fn size_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("size", args, 1, line)?;
    let dims = value_dims(&args[0]);

    Ok(Value::RetList(RetList::new(move |expected, index| {
        if expected <= 1 {
            if index == 0 {
                let contents = dims.iter()
                                   .map(|&d| Value::Scalar(Scalar::from_usize(d)))
                                   .collect();
                Some(Value::Array(MultiArray::row(contents)))
            } else {
                None
            }
        } else if index < expected {
            // the last requested output collapses the remaining dimensions
            let size = if index + 1 == expected {
                dims.iter().skip(index).product::<usize>()
            } else {
                dims.get(index).copied().unwrap_or(1)
            };
            Some(Value::Scalar(Scalar::from_usize(size)))
        } else {
            None
        }
    })))
}

fn numel_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("numel", args, 1, line)?;
    let count: usize = value_dims(&args[0]).iter().product();
    Ok(Value::Scalar(Scalar::from_usize(count)))
}

fn ndims_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("ndims", args, 1, line)?;
    Ok(Value::Scalar(Scalar::from_usize(value_dims(&args[0]).len())))
}

fn find_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("find", args, 1, line)?;
    let array = to_array(&args[0], "find", line)?;
    Ok(Value::Array(array.find()))
}

fn sum_fn(ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("sum", args, 1, line)?;
    let array = to_array(&args[0], "sum", line)?;
    array.reduce(Scalar::zero(), &ev.context, |acc, x, ctx| acc.add(x, ctx))
         .map_err(|e| ev.array_error(e, line))
}

fn prod_fn(ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    check_arity("prod", args, 1, line)?;
    let array = to_array(&args[0], "prod", line)?;
    array.reduce(Scalar::one(), &ev.context, |acc, x, ctx| acc.mul(x, ctx))
         .map_err(|e| ev.array_error(e, line))
}

fn reshape_fn(ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    if args.len() < 2 {
        return Err(EvalError::WrongArgumentCount { name:     "reshape".to_string(),
                                                   expected: 2,
                                                   found:    args.len(),
                                                   line });
    }
    let array = to_array(&args[0], "reshape", line)?;

    let dims = if args.len() == 2 && matches!(args[1], Value::Array(_)) {
        let Value::Array(shape) = &args[1] else { unreachable!() };
        shape.contents
             .iter()
             .map(|v| dimension_of(v, line))
             .collect::<EvalResult<Vec<usize>>>()?
    } else {
        args[1..].iter()
                 .map(|v| dimension_of(v, line))
                 .collect::<EvalResult<Vec<usize>>>()?
    };

    array.reshape(dims)
         .map(MultiArray::into_value)
         .map_err(|e| ev.array_error(e, line))
}

fn zeros_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    filled_array(args, Scalar::zero(), line)
}

fn ones_fn(_ev: &mut Evaluator, args: &[Value], line: usize) -> EvalResult<Value> {
    filled_array(args, Scalar::one(), line)
}

fn filled_array(args: &[Value], fill: Scalar, line: usize) -> EvalResult<Value> {
    let dims = match args.len() {
        0 => vec![1, 1],
        1 => {
            let n = dimension_of(&args[0], line)?;
            vec![n, n]
        },
        _ => args.iter()
                 .map(|v| dimension_of(v, line))
                 .collect::<EvalResult<Vec<usize>>>()?,
    };
    Ok(MultiArray::filled(dims, Value::Scalar(fill)).into_value())
}

fn dimension_of(value: &Value, line: usize) -> EvalResult<usize> {
    match value {
        Value::Scalar(s) if s.is_real() => s.re.to_index().ok_or(EvalError::TypeMismatch { details: "dimensions must be non-negative integers".to_string(),
                                                                                           line }),
        _ => Err(EvalError::TypeMismatch { details: "dimensions must be non-negative integers".to_string(),
                                           line }),
    }
}

fn value_dims(value: &Value) -> Vec<usize> {
    match value {
        Value::Array(a) => a.dims.clone(),
        _ => vec![1, 1],
    }
}

fn to_array(value: &Value, name: &str, line: usize) -> EvalResult<MultiArray> {
    match value {
        Value::Array(a) if !a.cell => Ok(a.clone()),
        Value::Scalar(_) | Value::CharString(_) => {
            Ok(MultiArray::from_element(value.clone()))
        },
        other => Err(EvalError::TypeMismatch { details: format!("'{name}' is not defined for a {}",
                                                                other.type_name()),
                                               line }),
    }
}

fn check_arity(name: &str, args: &[Value], expected: usize, line: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::WrongArgumentCount { name: name.to_string(),
                                            expected,
                                            found: args.len(),
                                            line })
    }
}

/// Builds the base function table.
///
/// Each entry provides a name, an implementation kind, and optionally a
/// decorative MathML renderer. Scalar functions register as mappers and
/// lift element-wise over a single array argument.
macro_rules! base_functions {
    (
        $table:ident;
        $(
            $name:literal => { kind: $kind:expr $(, mathml: $ml:expr)? $(,)? }
        ),* $(,)?
    ) => {
        $(
            {
                #[allow(unused_mut, unused_assignments)]
                let mut mathml: Option<MathMLFn> = None;
                $( mathml = Some($ml); )?
                $table.insert($name.to_string(), FunctionEntry { kind: $kind, mathml });
            }
        )*
    };
}

/// The built-in base function table.
#[must_use]
pub fn default_base_table() -> HashMap<String, FunctionEntry> {
    let mut table = HashMap::new();
    base_functions! {
        table;
        "abs"       => { kind: FunctionKind::Mapper(abs_fn), mathml: mathml::abs_markup },
        "arg"       => { kind: FunctionKind::Mapper(arg_fn) },
        "angle"     => { kind: FunctionKind::Mapper(arg_fn) },
        "sign"      => { kind: FunctionKind::Mapper(sign_fn) },
        "conj"      => { kind: FunctionKind::Mapper(conj_fn) },
        "real"      => { kind: FunctionKind::Mapper(real_fn) },
        "imag"      => { kind: FunctionKind::Mapper(imag_fn) },
        "floor"     => { kind: FunctionKind::Mapper(floor_fn) },
        "ceil"      => { kind: FunctionKind::Mapper(ceil_fn) },
        "round"     => { kind: FunctionKind::Mapper(round_fn) },
        "fix"       => { kind: FunctionKind::Mapper(fix_fn) },
        "sqrt"      => { kind: FunctionKind::Mapper(sqrt_fn), mathml: mathml::sqrt_markup },
        "exp"       => { kind: FunctionKind::Mapper(exp_fn) },
        "log"       => { kind: FunctionKind::Mapper(log_fn) },
        "log10"     => { kind: FunctionKind::Mapper(log10_fn), mathml: mathml::log10_markup },
        "logb"      => { kind: FunctionKind::Binary(logb_fn), mathml: mathml::logb_markup },
        "gamma"     => { kind: FunctionKind::Mapper(gamma_fn), mathml: mathml::gamma_markup },
        "factorial" => { kind: FunctionKind::Mapper(factorial_fn),
                         mathml: mathml::factorial_markup },
        "sin"       => { kind: FunctionKind::Mapper(sin_fn) },
        "cos"       => { kind: FunctionKind::Mapper(cos_fn) },
        "tan"       => { kind: FunctionKind::Mapper(tan_fn) },
        "csc"       => { kind: FunctionKind::Mapper(csc_fn) },
        "sec"       => { kind: FunctionKind::Mapper(sec_fn) },
        "cot"       => { kind: FunctionKind::Mapper(cot_fn) },
        "asin"      => { kind: FunctionKind::Mapper(asin_fn) },
        "acos"      => { kind: FunctionKind::Mapper(acos_fn) },
        "atan"      => { kind: FunctionKind::Mapper(atan_fn) },
        "acsc"      => { kind: FunctionKind::Mapper(acsc_fn) },
        "asec"      => { kind: FunctionKind::Mapper(asec_fn) },
        "acot"      => { kind: FunctionKind::Mapper(acot_fn) },
        "sinh"      => { kind: FunctionKind::Mapper(sinh_fn) },
        "cosh"      => { kind: FunctionKind::Mapper(cosh_fn) },
        "tanh"      => { kind: FunctionKind::Mapper(tanh_fn) },
        "csch"      => { kind: FunctionKind::Mapper(csch_fn) },
        "sech"      => { kind: FunctionKind::Mapper(sech_fn) },
        "coth"      => { kind: FunctionKind::Mapper(coth_fn) },
        "asinh"     => { kind: FunctionKind::Mapper(asinh_fn) },
        "acosh"     => { kind: FunctionKind::Mapper(acosh_fn) },
        "atanh"     => { kind: FunctionKind::Mapper(atanh_fn) },
        "acsch"     => { kind: FunctionKind::Mapper(acsch_fn) },
        "asech"     => { kind: FunctionKind::Mapper(asech_fn) },
        "acoth"     => { kind: FunctionKind::Mapper(acoth_fn) },
        "size"      => { kind: FunctionKind::Variadic(size_fn) },
        "numel"     => { kind: FunctionKind::Variadic(numel_fn) },
        "ndims"     => { kind: FunctionKind::Variadic(ndims_fn) },
        "find"      => { kind: FunctionKind::Variadic(find_fn) },
        "sum"       => { kind: FunctionKind::Variadic(sum_fn) },
        "prod"      => { kind: FunctionKind::Variadic(prod_fn) },
        "reshape"   => { kind: FunctionKind::Variadic(reshape_fn) },
        "zeros"     => { kind: FunctionKind::Variadic(zeros_fn) },
        "ones"      => { kind: FunctionKind::Variadic(ones_fn) },
    }
    table
}
