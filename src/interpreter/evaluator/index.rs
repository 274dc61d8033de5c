use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{Ast, Delimiter, NodeId, NodeKind},
    error::EvalError,
    interpreter::{
        evaluator::{
            builtin::{Argument, FunctionKind},
            core::{Binding, EvalResult, Evaluator, UserFunction},
        },
        value::{
            core::Value,
            multiarray::{MultiArray, Subscript},
            scalar::{NumberClass, Scalar},
        },
    },
};

impl Evaluator {
    /// Evaluates an index/call node through the §4.1 resolution order:
    /// base-function table (through the alias resolver) → local scope →
    /// variable subscripting → user function call.
    pub(crate) fn eval_index(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Option<Value>> {
        let line = ast.line(id);
        let NodeKind::Index { delimiter } = ast.kind(id) else {
            return Err(EvalError::MissingValue { line });
        };
        let delimiter = *delimiter;
        let children = ast.children(id).to_vec();
        let head = children[0];
        let args = &children[1..];

        let NodeKind::Ident(name) = ast.kind(head) else {
            let value = self.eval_operand(ast, head)?;
            return self.index_into_value(ast, value, args, delimiter, line).map(Some);
        };
        let name = name.clone();

        let canonical = self.resolve_alias(&name);
        if self.base.contains_key(&canonical) {
            return self.call_base(ast, &canonical, args, line).map(Some);
        }

        if let Some(frame) = self.locals.last() {
            if let Some(value) = frame.get(&name) {
                let value = value.clone();
                if args.is_empty() {
                    return Ok(Some(value));
                }
                return self.index_into_value(ast, value, args, delimiter, line).map(Some);
            }
        }

        match self.names.get(&name).cloned() {
            Some(Binding::Variable(value)) => {
                if args.is_empty() {
                    return Ok(Some(value));
                }
                self.index_into_value(ast, value, args, delimiter, line).map(Some)
            },
            Some(Binding::Function(function)) => {
                self.call_user(&name, &function, ast, args, line).map(Some)
            },
            None => Err(EvalError::UndefinedSymbol { name, line }),
        }
    }

    /// Subscripts a value. Only arrays are indexable; the scalar, string
    /// and structure variants fail on a non-empty argument list.
    pub(crate) fn index_into_value(&mut self,
                                   ast: &Rc<Ast>,
                                   value: Value,
                                   args: &[NodeId],
                                   delimiter: Delimiter,
                                   line: usize)
                                   -> EvalResult<Value> {
        let array = match value {
            Value::Array(array) => array,
            other => {
                if args.is_empty() {
                    return Ok(other);
                }
                return Err(EvalError::InvalidIndexing { details: format!("cannot index a {}",
                                                                         other.type_name()),
                                                        line });
            },
        };
        if args.is_empty() {
            return Ok(Value::Array(array));
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for &arg in args {
            arg_values.push(self.eval_operand(ast, arg)?);
        }
        self.read_array(&array, &arg_values, delimiter, line)
    }

    /// The read side of array indexing: logical masks, linear subscripts,
    /// and per-dimension subscripts, plus `{}` cell-content extraction.
    pub(crate) fn read_array(&self,
                             array: &MultiArray,
                             arg_values: &[Value],
                             delimiter: Delimiter,
                             line: usize)
                             -> EvalResult<Value> {
        if delimiter == Delimiter::Brace && !array.cell {
            return Err(EvalError::InvalidIndexing { details: "brace indexing of a non-cell array".to_string(),
                                                    line });
        }

        let result = if let [single] = arg_values
            && let Some(mask) = logical_mask(single)
        {
            array.read_logical(&mask)
        } else {
            let mut subs = Vec::with_capacity(arg_values.len());
            for value in arg_values {
                subs.push(Subscript::from_value(value).map_err(|e| self.array_error(e, line))?);
            }
            if let [sub] = subs.as_slice() {
                array.read_linear(sub)
            } else {
                array.read_subscripts(&subs)
            }
        };
        let result = result.map_err(|e| self.array_error(e, line))?;

        if delimiter == Delimiter::Brace {
            return match result {
                Value::Array(cells) if cells.cell => {
                    if cells.numel() == 1 {
                        Ok(cells.contents.into_iter().next().unwrap_or(Value::Array(MultiArray::empty())))
                    } else {
                        Err(EvalError::InvalidIndexing { details: "brace indexing must select a single cell".to_string(),
                                                         line })
                    }
                },
                other => Ok(other),
            };
        }
        Ok(result)
    }

    /// Calls an entry of the base function table.
    fn call_base(&mut self,
                 ast: &Rc<Ast>,
                 name: &str,
                 args: &[NodeId],
                 line: usize)
                 -> EvalResult<Value> {
        let Some(entry) = self.base.get(name).cloned() else {
            return Err(EvalError::UndefinedSymbol { name: name.to_string(),
                                                    line });
        };

        match entry.kind {
            FunctionKind::Unary(f) => {
                self.check_arity(name, args, 1, line)?;
                let value = self.eval_operand(ast, args[0])?;
                f(&self.context, &value, line)
            },
            FunctionKind::Binary(f) => {
                self.check_arity(name, args, 2, line)?;
                let left = self.eval_operand(ast, args[0])?;
                let right = self.eval_operand(ast, args[1])?;
                f(&self.context, &left, &right, line)
            },
            FunctionKind::Variadic(f) => {
                let mut values = Vec::with_capacity(args.len());
                for &arg in args {
                    values.push(self.eval_operand(ast, arg)?);
                }
                f(self, &values, line)
            },
            FunctionKind::Mapper(f) => {
                if args.len() != 1 {
                    return Err(EvalError::MapperArguments { name: name.to_string(),
                                                            line });
                }
                match self.eval_operand(ast, args[0])? {
                    Value::Scalar(s) => f(&self.context, &s, line),
                    Value::Array(a) if !a.cell => {
                        let mut contents = Vec::with_capacity(a.contents.len());
                        for element in &a.contents {
                            let Value::Scalar(s) = element else {
                                return Err(EvalError::TypeMismatch { details: format!("'{name}' is not defined for strings"),
                                                                     line });
                            };
                            contents.push(f(&self.context, s, line)?);
                        }
                        MultiArray::new(a.dims.clone(), contents, false)
                            .map(MultiArray::into_value)
                            .map_err(|e| self.array_error(e, line))
                    },
                    other => Err(EvalError::TypeMismatch { details: format!("'{name}' is not defined for a {}",
                                                                            other.type_name()),
                                                           line }),
                }
            },
            FunctionKind::External { ev_mask, func } => {
                let mut prepared = Vec::with_capacity(args.len());
                for (i, &arg) in args.iter().enumerate() {
                    let eager = ev_mask.get(i).copied().unwrap_or(true);
                    prepared.push(if eager {
                                      Argument::Value(self.eval_operand(ast, arg)?)
                                  } else {
                                      Argument::Deferred(arg)
                                  });
                }
                func(self, ast, &prepared, line)
            },
        }
    }

    /// Calls a user function: arity check, arguments evaluated in the
    /// caller's scope, a fresh frame pushed for the body.
    ///
    /// The frame stack makes recursion and re-entrancy correct by
    /// construction.
    fn call_user(&mut self,
                 name: &str,
                 function: &UserFunction,
                 ast: &Rc<Ast>,
                 args: &[NodeId],
                 line: usize)
                 -> EvalResult<Value> {
        if args.len() != function.params.len() {
            return Err(EvalError::WrongArgumentCount { name:     name.to_string(),
                                                       expected: function.params.len(),
                                                       found:    args.len(),
                                                       line });
        }

        let mut frame = HashMap::with_capacity(args.len());
        for (param, &arg) in function.params.iter().zip(args) {
            frame.insert(param.clone(), self.eval_operand(ast, arg)?);
        }

        self.locals.push(frame);
        let result = self.eval_node(&function.ast, function.body);
        self.locals.pop();

        result?.ok_or(EvalError::MissingValue { line })
    }

    fn check_arity(&self,
                   name: &str,
                   args: &[NodeId],
                   expected: usize,
                   line: usize)
                   -> EvalResult<()> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::WrongArgumentCount { name: name.to_string(),
                                                expected,
                                                found: args.len(),
                                                line })
        }
    }

    /// Resolves the `end`/`:` sentinels by walking the parent chain to the
    /// nearest enclosing index of a bound array-valued variable.
    pub(crate) fn resolve_sentinel(&mut self,
                                   ast: &Rc<Ast>,
                                   id: NodeId,
                                   colon: bool)
                                   -> EvalResult<Value> {
        let line = ast.line(id);
        let token = if colon { ":" } else { "end" };

        let mut current = id;
        loop {
            let Some(parent) = ast.node(current).parent.get() else {
                return Err(EvalError::ContextToken { token, line });
            };
            let inside_args = matches!(ast.kind(parent), NodeKind::Index { .. })
                              && ast.node(current).position.get() > 0;
            if !inside_args {
                current = parent;
                continue;
            }

            let argument = ast.node(current).position.get() - 1;
            let argument_count = ast.children(parent).len() - 1;
            let head = ast.children(parent)[0];
            let NodeKind::Ident(name) = ast.kind(head) else {
                return Err(EvalError::ContextToken { token, line });
            };
            let Some(Value::Array(array)) = self.lookup_value(name) else {
                return Err(EvalError::ContextToken { token, line });
            };

            let length = if argument_count == 1 {
                array.numel()
            } else {
                array.dim(argument)
            };

            return if colon {
                let contents = (1..=length).map(|k| Value::Scalar(Scalar::from_usize(k)))
                                           .collect();
                Ok(Value::Array(MultiArray::row(contents)))
            } else {
                Ok(Value::Scalar(Scalar::from_usize(length)))
            };
        }
    }

    /// Reads a field-access expression: the object is evaluated, then the
    /// designators are traversed; dynamic designators must evaluate to
    /// strings.
    pub(crate) fn eval_field_read(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Value> {
        let line = ast.line(id);
        let children = ast.children(id).to_vec();
        let object = self.eval_operand(ast, children[0])?;
        let path = self.designator_path(ast, &children[1..])?;

        let structure = match object {
            Value::Struct(structure) => structure,
            other => {
                let name = match ast.kind(children[0]) {
                    NodeKind::Ident(name) => name.clone(),
                    _ => other.type_name().to_string(),
                };
                return Err(EvalError::NotAStructure { name, line });
            },
        };

        structure.get_path(&path)
                 .cloned()
                 .map_err(|name| EvalError::UndefinedField { name, line })
    }

    /// Resolves field designator nodes to names: identifiers literally,
    /// anything else by evaluation to a string.
    pub(crate) fn designator_path(&mut self,
                                  ast: &Rc<Ast>,
                                  designators: &[NodeId])
                                  -> EvalResult<Vec<String>> {
        let mut path = Vec::with_capacity(designators.len());
        for &node in designators {
            match ast.kind(node) {
                NodeKind::Ident(name) => path.push(name.clone()),
                _ => match self.eval_operand(ast, node)? {
                    Value::CharString(s) => path.push(s.text),
                    _ => {
                        return Err(EvalError::FieldNameNotString { line: ast.line(node) })
                    },
                },
            }
        }
        Ok(path)
    }
}

/// A logical mask argument: a logical-class array, or a single logical
/// scalar promoted to a 1×1 mask.
pub(crate) fn logical_mask(value: &Value) -> Option<MultiArray> {
    match value {
        Value::Array(a)
            if a.class == crate::interpreter::value::multiarray::ElementClass::Logical
               && !a.cell =>
        {
            Some(a.clone())
        },
        Value::Scalar(s) if s.class == NumberClass::Logical => {
            Some(MultiArray::from_element(Value::Scalar(s.clone())))
        },
        _ => None,
    }
}
