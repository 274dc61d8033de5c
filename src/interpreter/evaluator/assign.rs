use std::rc::Rc;

use crate::{
    ast::{Ast, BinaryOp, Delimiter, NodeId, NodeKind},
    error::EvalError,
    interpreter::{
        evaluator::core::{Binding, EvalResult, Evaluator, UserFunction},
        value::{
            core::{RetList, Value},
            multiarray::{MultiArray, Subscript},
            structure::Structure,
        },
    },
};

/// One decomposed assignment target: an identifier (or the `~` discard),
/// its index-argument nodes, and its field path.
pub(crate) struct Target {
    /// `None` is the wildcard discard.
    pub name:      Option<String>,
    /// Unevaluated index-argument nodes.
    pub index:     Vec<NodeId>,
    /// The delimiter the index was written with.
    pub delimiter: Delimiter,
    /// The field path designators.
    pub fields:    Vec<FieldSel>,
}

/// A field designator of an assignment target.
pub(crate) enum FieldSel {
    /// A literal field name.
    Literal(String),
    /// A dynamic designator, evaluated at store time.
    Dynamic(NodeId),
}

impl Evaluator {
    /// Evaluates an assignment node.
    ///
    /// The left side is decomposed into targets first; when the single
    /// target is an index list of all-unbound identifiers, the
    /// function-definition rule fires and the right side is registered
    /// unevaluated. Otherwise the right side is evaluated once and
    /// distributed.
    pub(crate) fn eval_assign(&mut self,
                              ast: &Rc<Ast>,
                              id: NodeId,
                              op: Option<BinaryOp>)
                              -> EvalResult<Option<Value>> {
        let line = ast.line(id);
        let children = ast.children(id).to_vec();
        let (lhs, rhs) = (children[0], children[1]);

        let targets = self.decompose_targets(ast, lhs, true)?;
        if targets.len() > 1 && op.is_some() {
            return Err(EvalError::ComputedMultipleAssignment { line });
        }

        if op.is_none()
           && let [target] = targets.as_slice()
           && self.is_function_definition(ast, target)
        {
            let Some(name) = target.name.clone() else {
                return Err(EvalError::InvalidAssignmentTarget { line });
            };
            let params = target.index
                               .iter()
                               .map(|&arg| match ast.kind(arg) {
                                   NodeKind::Ident(param) => param.clone(),
                                   _ => String::new(),
                               })
                               .collect();
            let function = UserFunction { params,
                                          ast: Rc::clone(ast),
                                          body: rhs };
            self.names.insert(name, Binding::Function(function));
            return Ok(None);
        }

        let produced = self.eval_node(ast, rhs)?
                           .ok_or(EvalError::MissingValue { line })?;

        if let [target] = targets.as_slice() {
            let value = produced.collapse().ok_or(EvalError::MissingValue { line })?;
            return self.apply_target(ast, target, value, op, line);
        }

        let list = match produced {
            Value::RetList(list) => list,
            single => RetList::single(single),
        };
        let expected = targets.len();
        for (i, target) in targets.iter().enumerate() {
            let value = list.select(expected, i)
                            .ok_or(EvalError::ReturnListElement { number: i + 1,
                                                                  line })?;
            self.apply_target(ast, target, value, None, line)?;
        }
        Ok(None)
    }

    /// The function-definition disambiguation rule: a paren index list
    /// whose arguments are all currently-unbound identifiers, with no
    /// field path.
    fn is_function_definition(&self, ast: &Rc<Ast>, target: &Target) -> bool {
        target.name.is_some()
        && target.fields.is_empty()
        && !target.index.is_empty()
        && target.delimiter == Delimiter::Paren
        && target.index.iter().all(|&arg| match ast.kind(arg) {
                                  NodeKind::Ident(name) => !self.is_bound(name),
                                  _ => false,
                              })
    }

    /// Validates and decomposes the left side of an assignment. A
    /// single-row matrix of targets is accepted only at the top level of a
    /// plain `=`.
    fn decompose_targets(&self,
                         ast: &Rc<Ast>,
                         lhs: NodeId,
                         top_level: bool)
                         -> EvalResult<Vec<Target>> {
        let line = ast.line(lhs);
        match ast.kind(lhs) {
            NodeKind::Ident(name) => Ok(vec![Target { name:      Some(name.clone()),
                                                      index:     Vec::new(),
                                                      delimiter: Delimiter::Paren,
                                                      fields:    Vec::new(), }]),
            NodeKind::Wildcard => Ok(vec![Target { name:      None,
                                                   index:     Vec::new(),
                                                   delimiter: Delimiter::Paren,
                                                   fields:    Vec::new(), }]),
            NodeKind::Index { delimiter } => {
                let children = ast.children(lhs);
                let NodeKind::Ident(name) = ast.kind(children[0]) else {
                    return Err(EvalError::InvalidAssignmentTarget { line });
                };
                Ok(vec![Target { name:      Some(name.clone()),
                                 index:     children[1..].to_vec(),
                                 delimiter: *delimiter,
                                 fields:    Vec::new(), }])
            },
            NodeKind::Field => {
                let children = ast.children(lhs);
                let (name, index, delimiter) = match ast.kind(children[0]) {
                    NodeKind::Ident(name) => (name.clone(), Vec::new(), Delimiter::Paren),
                    NodeKind::Index { delimiter } => {
                        let inner = ast.children(children[0]);
                        let NodeKind::Ident(name) = ast.kind(inner[0]) else {
                            return Err(EvalError::InvalidAssignmentTarget { line });
                        };
                        (name.clone(), inner[1..].to_vec(), *delimiter)
                    },
                    _ => return Err(EvalError::InvalidAssignmentTarget { line }),
                };
                let fields = children[1..].iter()
                                          .map(|&d| match ast.kind(d) {
                                              NodeKind::Ident(field) => {
                                                  FieldSel::Literal(field.clone())
                                              },
                                              _ => FieldSel::Dynamic(d),
                                          })
                                          .collect();
                Ok(vec![Target { name: Some(name),
                                 index,
                                 delimiter,
                                 fields }])
            },
            NodeKind::Matrix { rows, cell: false } if top_level && rows.len() <= 1 => {
                let mut targets = Vec::new();
                for &child in ast.children(lhs) {
                    targets.extend(self.decompose_targets(ast, child, false)?);
                }
                if targets.is_empty() {
                    return Err(EvalError::InvalidAssignmentTarget { line });
                }
                Ok(targets)
            },
            _ => Err(EvalError::InvalidAssignmentTarget { line }),
        }
    }

    /// Stores one value into one target, computing the compound operator
    /// against the target's current value first when present.
    fn apply_target(&mut self,
                    ast: &Rc<Ast>,
                    target: &Target,
                    value: Value,
                    op: Option<BinaryOp>,
                    line: usize)
                    -> EvalResult<Option<Value>> {
        let Some(name) = target.name.clone() else {
            return Ok(None);
        };

        let value = match op {
            Some(op) => {
                let current = self.read_target(ast, target, &name, line)?;
                self.binary_values(op, &current, &value, line)?
            },
            None => value,
        };

        if !target.fields.is_empty() {
            if !target.index.is_empty() {
                return Err(EvalError::InvalidAssignmentTarget { line });
            }
            self.assign_field(ast, &name, &target.fields, value.clone(), line)?;
        } else if target.index.is_empty() {
            self.names.insert(name, Binding::Variable(value.clone()));
        } else {
            self.assign_indexed(ast, &name, target, value.clone(), line)?;
        }
        Ok(Some(value))
    }

    /// Reads a target's current value, for the compound operators; the
    /// target must already exist.
    fn read_target(&mut self,
                   ast: &Rc<Ast>,
                   target: &Target,
                   name: &str,
                   line: usize)
                   -> EvalResult<Value> {
        let current = self.lookup_value(name)
                          .cloned()
                          .ok_or_else(|| EvalError::UndefinedSymbol { name: name.to_string(),
                                                                      line })?;
        if !target.fields.is_empty() {
            let path = self.field_sel_path(ast, &target.fields)?;
            let Value::Struct(structure) = current else {
                return Err(EvalError::NotAStructure { name: name.to_string(),
                                                      line });
            };
            return structure.get_path(&path)
                            .cloned()
                            .map_err(|field| EvalError::UndefinedField { name: field,
                                                                         line });
        }
        if target.index.is_empty() {
            return Ok(current);
        }
        self.index_into_value(ast, current, &target.index, target.delimiter, line)
    }

    fn assign_field(&mut self,
                    ast: &Rc<Ast>,
                    name: &str,
                    fields: &[FieldSel],
                    value: Value,
                    line: usize)
                    -> EvalResult<()> {
        let path = self.field_sel_path(ast, fields)?;

        let mut structure = match self.names.get(name) {
            None => Structure::new(),
            Some(Binding::Variable(Value::Struct(s))) => s.clone(),
            Some(_) => {
                return Err(EvalError::NotAStructure { name: name.to_string(),
                                                      line })
            },
        };
        structure.set_path(&path, value)
                 .map_err(|field| EvalError::NotAStructure { name: field,
                                                             line })?;
        self.names
            .insert(name.to_string(), Binding::Variable(Value::Struct(structure)));
        Ok(())
    }

    fn field_sel_path(&mut self, ast: &Rc<Ast>, fields: &[FieldSel]) -> EvalResult<Vec<String>> {
        let mut path = Vec::with_capacity(fields.len());
        for selector in fields {
            match selector {
                FieldSel::Literal(name) => path.push(name.clone()),
                FieldSel::Dynamic(node) => match self.eval_operand(ast, *node)? {
                    Value::CharString(s) => path.push(s.text),
                    _ => return Err(EvalError::FieldNameNotString { line: ast.line(*node) }),
                },
            }
        }
        Ok(path)
    }

    /// Indexed assignment into an array (or the creation of one), with
    /// logical indexing, subscript indexing, and out-of-bounds growth.
    fn assign_indexed(&mut self,
                      ast: &Rc<Ast>,
                      name: &str,
                      target: &Target,
                      value: Value,
                      line: usize)
                      -> EvalResult<()> {
        let mut array = match self.names.get(name) {
            None => {
                let mut fresh = MultiArray::empty();
                fresh.cell = target.delimiter == Delimiter::Brace;
                fresh
            },
            Some(Binding::Variable(Value::Array(a))) => a.clone(),
            Some(Binding::Variable(existing @ (Value::Scalar(_) | Value::CharString(_)))) => {
                MultiArray::from_element(existing.clone())
            },
            Some(Binding::Variable(_)) => {
                return Err(EvalError::InvalidIndexing { details: format!("cannot index-assign a structure through '{name}'"),
                                                        line });
            },
            Some(Binding::Function(_)) => {
                return Err(EvalError::TypeMismatch { details: format!("indexed assignment on the function '{name}'"),
                                                     line });
            },
        };

        if target.delimiter == Delimiter::Brace && !array.cell {
            return Err(EvalError::InvalidIndexing { details: "brace assignment into a non-cell array".to_string(),
                                                    line });
        }

        let mut arg_values = Vec::with_capacity(target.index.len());
        for &arg in &target.index {
            arg_values.push(self.eval_operand(ast, arg)?);
        }

        let replacement = if target.delimiter == Delimiter::Brace {
            vec![value]
        } else {
            replacement_values(&value)
        };

        let logical = match arg_values.as_slice() {
            [single] => crate::interpreter::evaluator::index::logical_mask(single),
            _ => None,
        };

        let result = if let Some(mask) = logical {
            array.write_logical(&mask, &replacement)
        } else {
            let mut subs = Vec::with_capacity(arg_values.len());
            for value in &arg_values {
                subs.push(Subscript::from_value(value).map_err(|e| self.array_error(e, line))?);
            }
            if let [sub] = subs.as_slice() {
                array.write_linear(sub, &replacement)
            } else {
                array.write_subscripts(&subs, &replacement)
            }
        };
        result.map_err(|e| self.array_error(e, line))?;

        self.names
            .insert(name.to_string(), Binding::Variable(array.into_value()));
        Ok(())
    }
}

/// The replacement slice of an indexed write, in column-major order;
/// single values broadcast.
fn replacement_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(a) if !a.cell => (0..a.numel()).map(|l| a.get_linear(l).clone()).collect(),
        other => vec![other.clone()],
    }
}
