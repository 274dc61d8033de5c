use std::rc::Rc;

use crate::{
    ast::{Ast, BinaryOp, NodeId, NodeKind, PostfixOp, PrefixOp},
    error::EvalError,
    interpreter::{
        evaluator::core::{Binding, EvalResult, Evaluator},
        value::{core::Value, multiarray::MultiArray, scalar::Scalar},
    },
};

impl Evaluator {
    /// Evaluates a unary prefix operation. `++`/`--` mutate their
    /// identifier operand and yield the stepped value.
    pub(crate) fn eval_prefix(&mut self,
                              ast: &Rc<Ast>,
                              id: NodeId,
                              op: PrefixOp)
                              -> EvalResult<Value> {
        let line = ast.line(id);
        let operand = ast.children(id)[0];
        match op {
            PrefixOp::Plus => self.eval_operand(ast, operand),
            PrefixOp::Minus => {
                let value = self.eval_operand(ast, operand)?;
                self.negate_value(&value, line)
            },
            PrefixOp::Not => {
                let value = self.eval_operand(ast, operand)?;
                self.not_value(&value, line)
            },
            PrefixOp::Increment => self.step_identifier(ast, operand, 1, true),
            PrefixOp::Decrement => self.step_identifier(ast, operand, -1, true),
        }
    }

    /// Evaluates a unary postfix operation. `x++`/`x--` yield the value
    /// before the step; the transposes are rank-2 array operations that
    /// pass scalars and strings through (`'` conjugates scalars).
    pub(crate) fn eval_postfix(&mut self,
                               ast: &Rc<Ast>,
                               id: NodeId,
                               op: PostfixOp)
                               -> EvalResult<Value> {
        let line = ast.line(id);
        let operand = ast.children(id)[0];
        match op {
            PostfixOp::Increment => self.step_identifier(ast, operand, 1, false),
            PostfixOp::Decrement => self.step_identifier(ast, operand, -1, false),
            PostfixOp::Transpose => {
                let value = self.eval_operand(ast, operand)?;
                self.transpose_value(value, false, line)
            },
            PostfixOp::CTranspose => {
                let value = self.eval_operand(ast, operand)?;
                self.transpose_value(value, true, line)
            },
        }
    }

    fn negate_value(&self, value: &Value, line: usize) -> EvalResult<Value> {
        match value {
            Value::Scalar(s) => Ok(Value::Scalar(s.neg())),
            Value::Array(a) if !a.cell => {
                let mut contents = Vec::with_capacity(a.contents.len());
                for element in &a.contents {
                    match element {
                        Value::Scalar(s) => contents.push(Value::Scalar(s.neg())),
                        other => return Err(unary_type_error("-", other, line)),
                    }
                }
                MultiArray::new(a.dims.clone(), contents, false).map(MultiArray::into_value)
                                                                .map_err(|e| {
                                                                    self.array_error(e, line)
                                                                })
            },
            other => Err(unary_type_error("-", other, line)),
        }
    }

    fn not_value(&self, value: &Value, line: usize) -> EvalResult<Value> {
        match value {
            Value::Scalar(s) => Ok(Value::from(!s.is_true())),
            Value::Array(a) if !a.cell => {
                let mut contents = Vec::with_capacity(a.contents.len());
                for element in &a.contents {
                    match element {
                        Value::Scalar(s) => contents.push(Value::from(!s.is_true())),
                        other => return Err(unary_type_error("!", other, line)),
                    }
                }
                MultiArray::new(a.dims.clone(), contents, false).map(MultiArray::into_value)
                                                                .map_err(|e| {
                                                                    self.array_error(e, line)
                                                                })
            },
            other => Err(unary_type_error("!", other, line)),
        }
    }

    fn transpose_value(&self, value: Value, conjugate: bool, line: usize) -> EvalResult<Value> {
        match value {
            Value::Scalar(s) => Ok(Value::Scalar(if conjugate { s.conj() } else { s })),
            Value::CharString(_) => Ok(value),
            Value::Array(a) => a.transpose(conjugate)
                                .map(Value::Array)
                                .map_err(|e| self.array_error(e, line)),
            other => Err(unary_type_error(if conjugate { "'" } else { ".'" }, &other, line)),
        }
    }

    /// Shared `++`/`--` path: the operand must be a bound identifier; the
    /// binding is stepped by ±1 in place.
    fn step_identifier(&mut self,
                       ast: &Rc<Ast>,
                       operand: NodeId,
                       delta: i64,
                       prefix: bool)
                       -> EvalResult<Value> {
        let line = ast.line(operand);
        let NodeKind::Ident(name) = ast.kind(operand) else {
            return Err(EvalError::TypeMismatch { details: "'++' and '--' require a variable".to_string(),
                                                 line });
        };
        let name = name.clone();

        let current = self.lookup_value(&name)
                          .cloned()
                          .ok_or_else(|| EvalError::UndefinedSymbol { name: name.clone(),
                                                                      line })?;
        let step = Value::Scalar(Scalar::from_i64(delta));
        let stepped = self.binary_values(BinaryOp::Add, &current, &step, line)?;

        if let Some(frame) = self.locals.last_mut() {
            if frame.contains_key(&name) {
                frame.insert(name, stepped.clone());
                return Ok(if prefix { stepped } else { current });
            }
        }
        self.names.insert(name, Binding::Variable(stepped.clone()));
        Ok(if prefix { stepped } else { current })
    }
}

fn unary_type_error(symbol: &str, value: &Value, line: usize) -> EvalError {
    EvalError::TypeMismatch { details: format!("'{symbol}' is not defined for a {}",
                                               value.type_name()),
                              line }
}
