//! Tree‑walking evaluator.
//!
//! Statements complete with a [`Flow`]: `Normal`, or one of the two
//! non‑local exits (`Return`, `Break`).  Exits travel up through `Ok(..)`,
//! runtime failures through `Err(LoxError::Runtime)`, so the two never mix.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, ExprKind, LiteralValue, Stmt};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{Callable, LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Deepest chain of nested calls before reporting a stack overflow.
pub const MAX_CALL_DEPTH: usize = 256;

/// Deepest nesting of statements and expressions under evaluation at which
/// a further call is still allowed.  Calls whose bodies nest deeply hit this
/// before [`MAX_CALL_DEPTH`]; it is sized to fit the session thread's stack
/// (see [`crate::session::SESSION_STACK_SIZE`]).
pub const MAX_EVAL_DEPTH: usize = 30_000;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}

/// Source of the `clock()` native.
pub type Clock = fn() -> f64;

/// Wall‑clock seconds since the Unix epoch, with sub‑second precision.
pub fn system_clock() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    repl: bool,
    call_depth: usize,
    eval_depth: usize,
}

impl Interpreter {
    /// Creates a new Interpreter printing to `out`, with the system clock.
    pub fn new(out: Box<dyn Write>) -> Self {
        Self::with_clock(out, system_clock)
    }

    /// Creates a new Interpreter and defines the `clock` native from `clock`.
    pub fn with_clock(out: Box<dyn Write>, clock: Clock) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: Box::new(move |_args: &[Value]| Value::Number(clock())),
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            repl: false,
            call_depth: 0,
            eval_depth: 0,
        }
    }

    /// In REPL mode expression statements echo their value.
    pub fn set_repl(&mut self, repl: bool) {
        self.repl = repl;
    }

    /// Record that the variable use `id` lives `depth` frames out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Depth recorded for `id`, if it is a local.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops execution.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        for stmt in statements {
            // Resolver guarantees no stray `return`/`break` at top level.
            self.execute(stmt)?;
        }

        self.out.flush()?;
        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        self.eval_depth += 1;
        let flow: Result<Flow> = self.execute_stmt(stmt);
        self.eval_depth -= 1;

        flow
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let value: Value = self.evaluate(expr)?;
                if self.repl {
                    writeln!(self.out, "{}", value)?;
                }
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef = Environment::child(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let at: &Token = match &expr.kind {
                                ExprKind::Variable { name } => name,
                                _ => name,
                            };
                            return Err(LoxError::runtime(at, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                // Methods of a subclass close over an extra frame holding `super`.
                let method_env: EnvRef = match &superclass {
                    Some(class) => {
                        let env: EnvRef = Environment::child(&self.environment);
                        env.borrow_mut()
                            .define("super", Value::Class(Rc::clone(class)));
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let methods: HashMap<String, Rc<LoxFunction>> = methods
                    .iter()
                    .map(|method| {
                        let function = LoxFunction::new(
                            Rc::clone(method),
                            Rc::clone(&method_env),
                            method.name.lexeme == "init",
                        );
                        (method.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current
    /// environment afterwards on every path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);
        let result: Result<Flow> = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                exit => return Ok(exit),
            }
        }

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.eval_depth += 1;
        let value: Result<Value> = self.evaluate_expr(expr);
        self.eval_depth -= 1;

        value
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => self.evaluate_unary(operator, right),

            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable { name } => self.look_up_variable(name, expr.id),

            ExprKind::This { keyword } => self.look_up_variable(keyword, expr.id),

            ExprKind::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.local_depth(expr.id) {
                    Some(depth) => {
                        environment::assign_at(&self.environment, depth, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, values)
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let instance = match self.evaluate(object)? {
                    Value::Instance(instance) => instance,
                    _ => return Err(LoxError::runtime(name, "Only instances have fields.")),
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            ExprKind::Super { keyword, method } => self.evaluate_super(expr.id, keyword, method),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.local_depth(id) {
            Some(depth) => environment::get_at(&self.environment, depth, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        // The resolver rejects `super` outside a subclass method, so a missing
        // depth or `this` means the resolution table is out of step.
        let unresolved =
            || LoxError::runtime(keyword, "Internal error: 'super' was not resolved.");

        let depth: usize = self.local_depth(id).ok_or_else(unresolved)?;

        let superclass: Rc<LoxClass> =
            match environment::get_at(&self.environment, depth, keyword)? {
                Value::Class(class) => class,
                _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.")),
            };

        // `this` always sits in the frame just inside the one holding `super`.
        let this: Token = Token::synthetic("this", keyword.line);
        let instance: Rc<RefCell<LoxInstance>> = match depth
            .checked_sub(1)
            .map(|d| environment::get_at(&self.environment, d, &this))
            .transpose()?
        {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(unresolved()),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(&instance)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let callable: &dyn Callable = callee
            .as_callable()
            .ok_or_else(|| LoxError::runtime(paren, "Can only call function and classes"))?;

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments, but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH || self.eval_depth >= MAX_EVAL_DEPTH {
            debug!(
                "Refusing call at depth {} (nesting {})",
                self.call_depth, self.eval_depth
            );
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        debug!("Calling {} with {} argument(s)", callee, arguments.len());

        self.call_depth += 1;
        let result: Result<Value> = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression; both operands are evaluated left to right
    /// before any type check.
    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        let numbers = || -> Result<(f64, f64)> {
            match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
                _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
            }
        };

        let value: Value = match operator.token_type {
            TokenType::PLUS => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
                _ => {
                    return Err(LoxError::runtime(
                        operator,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },

            TokenType::MINUS => {
                let (a, b) = numbers()?;
                Value::Number(a - b)
            }
            TokenType::STAR => {
                let (a, b) = numbers()?;
                Value::Number(a * b)
            }
            // IEEE‑754: x / 0 is ±inf or NaN, never an error.
            TokenType::SLASH => {
                let (a, b) = numbers()?;
                Value::Number(a / b)
            }

            TokenType::GREATER => {
                let (a, b) = numbers()?;
                Value::Bool(a > b)
            }
            TokenType::GREATER_EQUAL => {
                let (a, b) = numbers()?;
                Value::Bool(a >= b)
            }
            TokenType::LESS => {
                let (a, b) = numbers()?;
                Value::Bool(a < b)
            }
            TokenType::LESS_EQUAL => {
                let (a, b) = numbers()?;
                Value::Bool(a <= b)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),
            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => return Err(LoxError::runtime(operator, "Invalid binary operator.")),
        };

        Ok(value)
    }
}
