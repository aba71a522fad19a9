use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable handle to an environment frame.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical frame: a name → value map chained to its enclosing frame.
/// The chain always ends at the globals.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable {}.", name.lexeme))
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shareable handle.
    pub fn child(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, replacing any earlier binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: this frame, then each enclosing frame.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Dynamic assignment to the nearest frame that already binds `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Look only in this frame.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk `distance` frames outward from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` exactly `distance` frames out, as recorded by the resolver.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    debug!("get_at '{}' distance {}", name.lexeme, distance);

    ancestor(env, distance)
        .and_then(|frame| frame.borrow().get_here(&name.lexeme))
        .ok_or_else(|| undefined(name))
}

/// Write `name` exactly `distance` frames out, as recorded by the resolver.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    debug!("assign_at '{}' distance {}", name.lexeme, distance);

    let frame: EnvRef = ancestor(env, distance).ok_or_else(|| undefined(name))?;
    frame.borrow_mut().define(&name.lexeme, value);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::synthetic(name, 1)
    }

    #[test]
    fn lookup_walks_the_chain() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child(&globals);
        inner.borrow_mut().define("b", Value::Bool(true));

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
        assert_eq!(get_at(&inner, 0, &ident("b")).unwrap(), Value::Bool(true));
        assert_eq!(get_at(&inner, 1, &ident("a")).unwrap(), Value::Number(1.0));
        assert!(get_at(&inner, 0, &ident("a")).is_err());
    }

    #[test]
    fn assign_updates_the_defining_frame() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child(&globals);

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();
        assert_eq!(globals.borrow().get_here("a"), Some(Value::Number(2.0)));
        assert_eq!(inner.borrow().get_here("a"), None);

        assign_at(&inner, 1, &ident("a"), Value::Nil).unwrap();
        assert_eq!(globals.borrow().get_here("a"), Some(Value::Nil));
    }

    #[test]
    fn undefined_variable_message() {
        let env = Environment::new();
        let err = env.get(&ident("nope")).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable nope.\n[line 1]");

        let mut env = env;
        assert!(env.assign(&ident("nope"), Value::Nil).is_err());
    }
}
