use std::{cmp::Ordering, rc::Rc};

use crate::{
    ast::{Ast, BinaryOp, NodeId},
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{core::Value, multiarray::MultiArray, real::MathContext, scalar::Scalar},
    },
};

/// Applies a binary operator to two scalars. Comparison results carry the
/// logical class; arithmetic results are plain decimals.
pub(crate) fn scalar_binary(ctx: &MathContext, op: BinaryOp, a: &Scalar, b: &Scalar) -> Value {
    match op {
        BinaryOp::Add => Value::Scalar(a.add(b, ctx)),
        BinaryOp::Sub => Value::Scalar(a.sub(b, ctx)),
        BinaryOp::Mul | BinaryOp::ElemMul => Value::Scalar(a.mul(b, ctx)),
        BinaryOp::Div | BinaryOp::ElemDiv => Value::Scalar(a.div(b, ctx)),
        BinaryOp::LeftDiv | BinaryOp::ElemLeftDiv => Value::Scalar(a.ldiv(b, ctx)),
        BinaryOp::Pow | BinaryOp::ElemPow => Value::Scalar(a.pow(b, ctx)),
        BinaryOp::Less => Value::from(matches!(a.compare(b, ctx), Some(Ordering::Less))),
        BinaryOp::LessEqual => {
            Value::from(matches!(a.compare(b, ctx), Some(Ordering::Less | Ordering::Equal)))
        },
        BinaryOp::Equal => Value::from(a.eq_display(b, ctx)),
        BinaryOp::GreaterEqual => {
            Value::from(matches!(a.compare(b, ctx),
                                 Some(Ordering::Greater | Ordering::Equal)))
        },
        BinaryOp::Greater => Value::from(matches!(a.compare(b, ctx), Some(Ordering::Greater))),
        BinaryOp::NotEqual => Value::from(!a.eq_display(b, ctx)),
        BinaryOp::And | BinaryOp::ShortAnd => Value::from(a.is_true() && b.is_true()),
        BinaryOp::Or | BinaryOp::ShortOr => Value::from(a.is_true() || b.is_true()),
    }
}

impl Evaluator {
    /// Evaluates a binary node: resolves both operands and applies the
    /// operator, with `&&`/`||` short-circuiting on the left's boolean
    /// projection.
    pub(crate) fn eval_binary_node(&mut self,
                                   ast: &Rc<Ast>,
                                   id: NodeId,
                                   op: BinaryOp)
                                   -> EvalResult<Value> {
        let line = ast.line(id);
        let children = ast.children(id).to_vec();

        if matches!(op, BinaryOp::ShortAnd | BinaryOp::ShortOr) {
            let left = self.eval_operand(ast, children[0])?;
            let left_true = left.is_true()
                                .map_err(|details| EvalError::TypeMismatch { details, line })?;
            match op {
                BinaryOp::ShortAnd if !left_true => return Ok(Value::from(false)),
                BinaryOp::ShortOr if left_true => return Ok(Value::from(true)),
                _ => {},
            }
            let right = self.eval_operand(ast, children[1])?;
            let right_true = right.is_true()
                                  .map_err(|details| EvalError::TypeMismatch { details, line })?;
            return Ok(Value::from(right_true));
        }

        let left = self.eval_operand(ast, children[0])?;
        let right = self.eval_operand(ast, children[1])?;
        self.binary_values(op, &left, &right, line)
    }

    /// Applies a binary operator to two values, broadcasting scalars over
    /// arrays; shape-mismatched non-scalars fail.
    pub(crate) fn binary_values(&self,
                                op: BinaryOp,
                                left: &Value,
                                right: &Value,
                                line: usize)
                                -> EvalResult<Value> {
        match (left, right) {
            (Value::Scalar(a), Value::Scalar(b)) => {
                Ok(scalar_binary(&self.context, op, a, b))
            },

            (Value::CharString(a), Value::CharString(b)) => match op {
                BinaryOp::Equal => Ok(Value::from(a.text == b.text)),
                BinaryOp::NotEqual => Ok(Value::from(a.text != b.text)),
                _ => Err(type_error(op, left, right, line)),
            },

            (Value::Array(a), Value::Array(b)) => self.array_array(op, a, b, line),
            (Value::Array(a), Value::Scalar(s)) => self.array_scalar(op, a, s, false, line),
            (Value::Scalar(s), Value::Array(a)) => self.array_scalar(op, a, s, true, line),

            _ => Err(type_error(op, left, right, line)),
        }
    }

    fn array_array(&self,
                   op: BinaryOp,
                   a: &MultiArray,
                   b: &MultiArray,
                   line: usize)
                   -> EvalResult<Value> {
        match op {
            BinaryOp::Mul => self.matmul(a, b, line).map(MultiArray::into_value),
            BinaryOp::Div | BinaryOp::LeftDiv => {
                Err(EvalError::ExternalOperation { details: "matrix division".to_string(),
                                                   line })
            },
            BinaryOp::Pow => {
                Err(EvalError::ExternalOperation { details: "matrix power with a matrix exponent".to_string(),
                                                   line })
            },
            _ => {
                if a.dims != b.dims {
                    return Err(EvalError::ShapeMismatch { details: format!("operands to '{}' differ in shape",
                                                                           op.symbol()),
                                                          line });
                }
                let mut contents = Vec::with_capacity(a.contents.len());
                for (x, y) in a.contents.iter().zip(&b.contents) {
                    contents.push(self.element_binary(op, x, y, line)?);
                }
                self.rebuild(a.dims.clone(), contents, line)
            },
        }
    }

    fn array_scalar(&self,
                    op: BinaryOp,
                    array: &MultiArray,
                    scalar: &Scalar,
                    scalar_on_left: bool,
                    line: usize)
                    -> EvalResult<Value> {
        // matrix power with an integer scalar exponent is repeated product
        if op == BinaryOp::Pow {
            if scalar_on_left {
                return Err(EvalError::ExternalOperation { details: "a scalar raised to a matrix".to_string(),
                                                          line });
            }
            return self.matrix_power(array, scalar, line);
        }

        let scalar = Value::Scalar(scalar.clone());
        let mut contents = Vec::with_capacity(array.contents.len());
        for element in &array.contents {
            let value = if scalar_on_left {
                self.element_binary(op, &scalar, element, line)?
            } else {
                self.element_binary(op, element, &scalar, line)?
            };
            contents.push(value);
        }
        self.rebuild(array.dims.clone(), contents, line)
    }

    fn element_binary(&self,
                      op: BinaryOp,
                      left: &Value,
                      right: &Value,
                      line: usize)
                      -> EvalResult<Value> {
        match (left, right) {
            (Value::Scalar(a), Value::Scalar(b)) => {
                Ok(scalar_binary(&self.context, op, a, b))
            },
            _ => Err(type_error(op, left, right, line)),
        }
    }

    fn rebuild(&self, dims: Vec<usize>, contents: Vec<Value>, line: usize) -> EvalResult<Value> {
        MultiArray::new(dims, contents, false).map(MultiArray::into_value)
                                              .map_err(|e| self.array_error(e, line))
    }

    fn matmul(&self, a: &MultiArray, b: &MultiArray, line: usize) -> EvalResult<MultiArray> {
        if a.rank() != 2 || b.rank() != 2 || a.dims[1] != b.dims[0] {
            return Err(EvalError::ShapeMismatch { details: format!("matrix product of {}x{} and {}x{}",
                                                                   a.dim(0),
                                                                   a.dim(1),
                                                                   b.dim(0),
                                                                   b.dim(1)),
                                                  line });
        }
        let (m, k, n) = (a.dims[0], a.dims[1], b.dims[1]);
        let ctx = &self.context;

        let mut contents = Vec::with_capacity(m * n);
        for i in 0..m {
            for j in 0..n {
                let mut acc = Scalar::zero();
                for t in 0..k {
                    let (x, y) = (&a.contents[i * k + t], &b.contents[t * n + j]);
                    let (Value::Scalar(x), Value::Scalar(y)) = (x, y) else {
                        return Err(EvalError::TypeMismatch { details: "matrix product of non-numeric arrays".to_string(),
                                                             line });
                    };
                    acc = acc.add(&x.mul(y, ctx), ctx);
                }
                contents.push(Value::Scalar(acc));
            }
        }
        MultiArray::new(vec![m, n], contents, false).map_err(|e| self.array_error(e, line))
    }

    fn matrix_power(&self,
                    base: &MultiArray,
                    exponent: &Scalar,
                    line: usize)
                    -> EvalResult<Value> {
        if base.rank() != 2 || base.dims[0] != base.dims[1] {
            return Err(EvalError::ShapeMismatch { details: "matrix power of a non-square matrix".to_string(),
                                                  line });
        }
        if !exponent.is_integer() || exponent.re.is_negative() {
            return Err(EvalError::ExternalOperation { details: "a non-integer or negative matrix power".to_string(),
                                                      line });
        }
        let Some(n) = exponent.re.to_index() else {
            return Err(EvalError::ExternalOperation { details: "an oversized matrix power".to_string(),
                                                      line });
        };

        let mut result = identity(base.dims[0]);
        for _ in 0..n {
            result = self.matmul(&result, base, line)?;
        }
        Ok(result.into_value())
    }
}

fn identity(size: usize) -> MultiArray {
    let mut contents = Vec::with_capacity(size * size);
    for i in 0..size {
        for j in 0..size {
            contents.push(Value::Scalar(if i == j { Scalar::one() } else { Scalar::zero() }));
        }
    }
    MultiArray { dims:     vec![size, size],
                 class:    crate::interpreter::value::multiarray::ElementClass::Decimal,
                 cell:     false,
                 contents, }
}

fn type_error(op: BinaryOp, left: &Value, right: &Value, line: usize) -> EvalError {
    EvalError::TypeMismatch { details: format!("'{}' is not defined for a {} and a {}",
                                               op.symbol(),
                                               left.type_name(),
                                               right.type_name()),
                              line }
}
