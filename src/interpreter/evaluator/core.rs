use std::{collections::HashMap, rc::Rc};

use regex::Regex;

use crate::{
    ast::{Ast, NodeId, NodeKind},
    error::{EvalError, ParseError},
    interpreter::{
        evaluator::{
            builtin::{default_base_table, FunctionEntry},
            command::{default_command_table, CommandFn},
        },
        parser,
        value::{
            core::Value,
            kernel,
            multiarray,
            real::{MathContext, Real},
            scalar::Scalar,
        },
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or an
/// `EvalError` describing the failure.
pub type EvalResult<T> = Result<T, EvalError>;

/// Exit status of the most recent entry-point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The call succeeded.
    Ok          = 0,
    /// The lexer rejected the input.
    LexError    = 1,
    /// The parser rejected the input.
    ParserError = 2,
    /// Evaluation raised an error.
    EvalError   = 3,
    /// A recoverable warning was reported.
    Warning     = -1,
    /// An external collaborator failed.
    External    = -2,
}

impl ExitStatus {
    /// The numeric code of this status.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// The names seeded at construction and restored by a bare `clear`.
pub const NATIVE_NAMES: &[&str] =
    &["false", "true", "i", "I", "j", "J", "e", "pi", "inf", "Inf", "nan", "NaN"];

/// The operator symbols the evaluator dispatches on.
pub const OPERATOR_NAMES: &[&str] =
    &["+", "-", ".*", "*", "./", "/", ".\\", "\\", ".^", "^", "<", "<=", "==", ">=", ">", "!=",
      "&", "|", "&&", "||", "!", "++", "--", ".'", "'"];

/// A name-table entry: a variable's value, or a user function whose body
/// stays unevaluated until the call.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A variable and its value.
    Variable(Value),
    /// A user-defined function.
    Function(UserFunction),
}

/// A user function registered by the function-definition assignment rule.
#[derive(Debug, Clone)]
pub struct UserFunction {
    /// The formal parameter names.
    pub params: Vec<String>,
    /// The arena the body lives in.
    pub ast:    Rc<Ast>,
    /// The unevaluated body expression.
    pub body:   NodeId,
}

/// Construction options of an [`Evaluator`].
///
/// The recognized options are exactly these three; everything else about
/// the evaluator is fixed at construction.
#[derive(Default)]
pub struct EvaluatorConfig {
    /// Canonical base-function name → pattern matching its accepted
    /// aliases.
    pub alias_table:        Vec<(String, Regex)>,
    /// Extra base functions, merged over the built-ins.
    pub external_functions: HashMap<String, FunctionEntry>,
    /// Extra command words, merged over the built-ins.
    pub external_commands:  HashMap<String, CommandFn>,
}

/// The tree-walking evaluator.
///
/// Owns the environment of §3.3: the name table, the native constants, the
/// base-function and command-word tables, the alias resolver, and the
/// local-scope frame stack, plus the numeric context every kernel
/// operation rounds through.
pub struct Evaluator {
    /// The instance-scoped numeric configuration.
    pub context: MathContext,
    pub(crate) names:    HashMap<String, Binding>,
    pub(crate) locals:   Vec<HashMap<String, Value>>,
    pub(crate) base:     HashMap<String, FunctionEntry>,
    pub(crate) commands: HashMap<String, CommandFn>,
    pub(crate) aliases:  Vec<(String, Regex)>,
    /// Status of the most recent entry-point call.
    pub exit_status: ExitStatus,
    /// When set, rendering errors in the MathML unparser re-raise instead
    /// of degrading to an error marker.
    pub debug: bool,
    pub(crate) display_log: Vec<String>,
}

#[allow(clippy::new_without_default)]
impl Evaluator {
    /// Creates an evaluator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EvaluatorConfig::default())
    }

    /// Creates an evaluator from a configuration object.
    #[must_use]
    pub fn with_config(config: EvaluatorConfig) -> Self {
        let mut base = default_base_table();
        base.extend(config.external_functions);

        let mut commands = default_command_table();
        commands.extend(config.external_commands);

        let mut evaluator = Self { context: MathContext::default(),
                                   names: HashMap::new(),
                                   locals: Vec::new(),
                                   base,
                                   commands,
                                   aliases: config.alias_table,
                                   exit_status: ExitStatus::Ok,
                                   debug: false,
                                   display_log: Vec::new() };
        evaluator.seed_natives();
        evaluator
    }

    /// Parses source text with the front end, publishing the command-word
    /// name set.
    ///
    /// # Errors
    /// Any front-end failure; `exit_status` is set to `LexError` or
    /// `ParserError` accordingly.
    pub fn parse(&mut self, source: &str) -> Result<Rc<Ast>, ParseError> {
        let commands = self.commands.keys().cloned().collect();
        match parser::parse(source, &commands) {
            Ok(ast) => Ok(Rc::new(ast)),
            Err(e) => {
                self.exit_status = if e.is_lexical() {
                    ExitStatus::LexError
                } else {
                    ExitStatus::ParserError
                };
                Err(e)
            },
        }
    }

    /// Evaluates a parsed program against the environment.
    ///
    /// Returns the value of the last statement, or `None` when it produced
    /// nothing.
    ///
    /// # Errors
    /// Re-raises any evaluation failure after setting `exit_status`.
    pub fn evaluate(&mut self, ast: &Rc<Ast>) -> EvalResult<Option<Value>> {
        ast.link();
        self.display_log.clear();
        match self.eval_node(ast, ast.root) {
            Ok(value) => {
                self.exit_status = ExitStatus::Ok;
                Ok(value)
            },
            Err(e) => {
                self.exit_status = ExitStatus::EvalError;
                Err(e)
            },
        }
    }

    /// Parses and evaluates source text in one step.
    ///
    /// # Errors
    /// Any front-end or evaluation failure.
    pub fn run(&mut self, source: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        let ast = self.parse(source)?;
        Ok(self.evaluate(&ast)?)
    }

    /// Parses and evaluates source text, returning the text rendering of
    /// every statement result whose display was not suppressed by `;`.
    ///
    /// # Errors
    /// Any front-end or evaluation failure.
    pub fn run_display(&mut self,
                       source: &str)
                       -> Result<Vec<String>, Box<dyn std::error::Error>> {
        self.run(source)?;
        Ok(std::mem::take(&mut self.display_log))
    }

    /// Removes names from the environment, restoring shadowed natives; an
    /// empty list performs the full reset.
    pub fn clear(&mut self, names: &[&str]) {
        if names.is_empty() {
            self.reset_names();
            return;
        }
        for name in names {
            self.clear_name(name);
        }
    }

    /// Performs a full reset, as `clear` with no arguments.
    pub fn restart(&mut self) {
        self.reset_names();
        self.locals.clear();
        self.exit_status = ExitStatus::Ok;
    }

    /// The registered base-function names, sorted.
    #[must_use]
    pub fn base_function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.base.keys().cloned().collect();
        names.sort();
        names
    }

    /// The currently bound names (variables and user functions), sorted.
    #[must_use]
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// The operator symbols the evaluator dispatches on.
    #[must_use]
    pub const fn operator_names(&self) -> &'static [&'static str] {
        OPERATOR_NAMES
    }

    /// The registered command-word names, sorted.
    #[must_use]
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolves a written name through the alias table; identity when no
    /// pattern matches.
    #[must_use]
    pub fn resolve_alias(&self, name: &str) -> String {
        for (canonical, pattern) in &self.aliases {
            if pattern.is_match(name) {
                return canonical.clone();
            }
        }
        name.to_string()
    }

    pub(crate) fn reset_names(&mut self) {
        self.names.clear();
        self.seed_natives();
    }

    pub(crate) fn clear_name(&mut self, name: &str) {
        self.names.remove(name);
        if NATIVE_NAMES.contains(&name) {
            if let Some(value) = self.native_value(name) {
                self.names.insert(name.to_string(), Binding::Variable(value));
            }
        }
    }

    fn seed_natives(&mut self) {
        for name in NATIVE_NAMES {
            if let Some(value) = self.native_value(name) {
                self.names.insert((*name).to_string(), Binding::Variable(value));
            }
        }
    }

    fn native_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "false" => Value::Scalar(Scalar::logical(false)),
            "true" => Value::Scalar(Scalar::logical(true)),
            "i" | "I" | "j" | "J" => Value::Scalar(Scalar::imaginary_unit()),
            "e" => Value::Scalar(Scalar::real(Real::Num(kernel::euler(&self.context)))),
            "pi" => Value::Scalar(Scalar::real(Real::Num(kernel::pi(&self.context)))),
            "inf" | "Inf" => Value::Scalar(Scalar::infinity()),
            "nan" | "NaN" => Value::Scalar(Scalar::nan()),
            _ => return None,
        };
        Some(value)
    }

    /// Reads a name through the resolution order: the current local frame,
    /// then the global name table's variables.
    pub(crate) fn lookup_value(&self, name: &str) -> Option<&Value> {
        if let Some(frame) = self.locals.last() {
            if let Some(value) = frame.get(name) {
                return Some(value);
            }
        }
        match self.names.get(name) {
            Some(Binding::Variable(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether a name has any binding visible from the current scope.
    pub(crate) fn is_bound(&self, name: &str) -> bool {
        if let Some(frame) = self.locals.last() {
            if frame.contains_key(name) {
                return true;
            }
        }
        self.names.contains_key(name)
    }

    /// Evaluates one node, dispatching on its discriminator.
    pub(crate) fn eval_node(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Option<Value>> {
        let line = ast.line(id);
        match ast.kind(id) {
            NodeKind::Number(s) => Ok(Some(Value::Scalar(s.clone()))),
            NodeKind::Str { text, double_quoted } => {
                use crate::interpreter::value::chars::{CharString, QuoteStyle};
                let quote = if *double_quoted { QuoteStyle::Double } else { QuoteStyle::Single };
                Ok(Some(Value::CharString(CharString::new(text.clone(), quote))))
            },
            NodeKind::Ident(name) => self.eval_identifier(name, line).map(Some),
            NodeKind::End => self.resolve_sentinel(ast, id, false).map(Some),
            NodeKind::Colon => self.resolve_sentinel(ast, id, true).map(Some),
            NodeKind::Wildcard => Err(EvalError::InvalidAssignmentTarget { line }),
            NodeKind::Binary(op) => self.eval_binary_node(ast, id, *op).map(Some),
            NodeKind::Prefix(op) => self.eval_prefix(ast, id, *op).map(Some),
            NodeKind::Postfix(op) => self.eval_postfix(ast, id, *op).map(Some),
            NodeKind::Paren => self.eval_node(ast, ast.children(id)[0]),
            NodeKind::Assign(op) => self.eval_assign(ast, id, *op),
            NodeKind::Range { .. } => self.eval_range(ast, id).map(Some),
            NodeKind::List { .. } => self.eval_list(ast, id),
            NodeKind::Index { .. } => self.eval_index(ast, id),
            NodeKind::Field => self.eval_field_read(ast, id).map(Some),
            NodeKind::Matrix { .. } => self.eval_matrix(ast, id).map(Some),
            NodeKind::Command { name, words } => {
                let name = name.clone();
                let words = words.clone();
                self.run_command(&name, &words, line)
            },
            NodeKind::If { .. } => self.eval_if(ast, id),
        }
    }

    /// Evaluates a node that must produce a single value, collapsing any
    /// return list to its first element.
    pub(crate) fn eval_operand(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Value> {
        let line = ast.line(id);
        self.eval_node(ast, id)?
            .and_then(Value::collapse)
            .ok_or(EvalError::MissingValue { line })
    }

    fn eval_identifier(&mut self, name: &str, line: usize) -> EvalResult<Value> {
        if let Some(value) = self.lookup_value(name) {
            return Ok(value.clone());
        }
        match self.names.get(name) {
            Some(Binding::Function(_)) => {
                Err(EvalError::CallWithoutArguments { name: name.to_string(),
                                                      line })
            },
            _ => Err(EvalError::UndefinedSymbol { name: name.to_string(),
                                                  line }),
        }
    }

    fn eval_range(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Value> {
        let line = ast.line(id);
        let children = ast.children(id).to_vec();

        let start = self.range_endpoint(ast, children[0])?;
        let stop = self.range_endpoint(ast, children[1])?;
        let stride = match children.get(2) {
            Some(&node) => self.range_endpoint(ast, node)?,
            None => Real::one(),
        };

        multiarray::range(&start, &stop, &stride, &self.context).map(multiarray::MultiArray::into_value)
                                                                .map_err(|e| self.array_error(e, line))
    }

    fn range_endpoint(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Real> {
        let line = ast.line(id);
        match self.eval_operand(ast, id)? {
            Value::Scalar(s) if s.is_real() => Ok(s.re),
            other => Err(EvalError::TypeMismatch { details: format!("range endpoints must be real, not a {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    fn eval_matrix(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Value> {
        let line = ast.line(id);
        let NodeKind::Matrix { rows, cell } = ast.kind(id) else {
            return Err(EvalError::MissingValue { line });
        };
        let rows = rows.clone();
        let cell = *cell;
        let children = ast.children(id).to_vec();

        let mut grouped = Vec::with_capacity(rows.len());
        let mut offset = 0usize;
        for width in rows {
            let mut row = Vec::with_capacity(width);
            for &child in &children[offset..offset + width] {
                row.push(self.eval_operand(ast, child)?);
            }
            offset += width;
            grouped.push(row);
        }

        multiarray::from_rows(grouped, cell).map(|a| {
                                                if cell {
                                                    Value::Array(a)
                                                } else {
                                                    a.into_value()
                                                }
                                            })
                                            .map_err(|e| self.array_error(e, line))
    }

    fn eval_list(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Option<Value>> {
        let NodeKind::List { omit_output } = ast.kind(id) else {
            return Ok(None);
        };
        let omit_output = omit_output.clone();
        let children = ast.children(id).to_vec();

        let mut last = None;
        for (i, &child) in children.iter().enumerate() {
            let is_command_rewrite = match ast.kind(child) {
                NodeKind::Ident(name) => {
                    !self.is_bound(name) && self.commands.contains_key(name)
                },
                _ => false,
            };

            let value = if is_command_rewrite {
                let NodeKind::Ident(name) = ast.kind(child) else { unreachable!() };
                let name = name.clone();
                self.run_command(&name, &[], ast.line(child))?
            } else {
                self.eval_node(ast, child)?
            };

            let is_command = is_command_rewrite
                             || matches!(ast.kind(child), NodeKind::Command { .. });
            let omitted = omit_output.get(i).copied().unwrap_or(false);

            if let Some(value) = value {
                if let Some(collapsed) = value.collapse() {
                    if !omitted && !is_command {
                        self.names
                            .insert("ans".to_string(), Binding::Variable(collapsed.clone()));
                        let text = unparse_value_text(&self.context, &collapsed);
                        self.display_log.push(text);
                    }
                    last = Some(collapsed);
                }
            }
        }
        Ok(last)
    }

    fn eval_if(&mut self, ast: &Rc<Ast>, id: NodeId) -> EvalResult<Option<Value>> {
        let NodeKind::If { conditions, has_else } = ast.kind(id) else {
            return Ok(None);
        };
        let conditions = *conditions;
        let has_else = *has_else;
        let children = ast.children(id).to_vec();

        for pair in 0..conditions {
            let cond_id = children[2 * pair];
            let line = ast.line(cond_id);
            let cond = self.eval_operand(ast, cond_id)?;
            let truthy = cond.is_true()
                             .map_err(|details| EvalError::TypeMismatch { details, line })?;
            if truthy {
                return self.eval_node(ast, children[2 * pair + 1]);
            }
        }
        if has_else {
            return self.eval_node(ast, children[2 * conditions]);
        }
        Ok(None)
    }

    fn run_command(&mut self,
                   name: &str,
                   words: &[String],
                   line: usize)
                   -> EvalResult<Option<Value>> {
        let Some(command) = self.commands.get(name).copied() else {
            return Err(EvalError::UndefinedSymbol { name: name.to_string(),
                                                    line });
        };
        command(self, words, line)
    }

    /// Maps a shape/index failure from the array layer onto an evaluator
    /// error at the raising node's line.
    pub(crate) fn array_error(&self,
                              e: crate::interpreter::value::multiarray::ArrayError,
                              line: usize)
                              -> EvalError {
        use crate::interpreter::value::multiarray::ArrayError;
        match e {
            ArrayError::OutOfBounds { length, found } => {
                EvalError::IndexOutOfBounds { length,
                                              found,
                                              line }
            },
            ArrayError::Index(details) => EvalError::InvalidIndexing { details, line },
            ArrayError::Shape(details) => EvalError::ShapeMismatch { details, line },
            ArrayError::Type(details) => EvalError::TypeMismatch { details, line },
        }
    }
}

/// Renders a value for the display log; total by construction.
fn unparse_value_text(ctx: &MathContext, value: &Value) -> String {
    crate::interpreter::evaluator::unparse::value_text(ctx, value)
}
