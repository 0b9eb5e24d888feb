use crate::lox_result::Result;
use crate::object::Object;
use crate::runtime_error::RuntimeError;
use crate::token::Token;

use std::collections::HashMap;

use gc::{Finalize, Gc, GcCell, Trace};

/// A lexically-chained scope. Cloning an `Environment` clones the handle,
/// not the frame, so closures and the interpreter share frames.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Environment(Gc<GcCell<EnvironmentInternal>>);

impl Environment {
    pub fn new(enclosing: Option<Environment>) -> Self {
        Self(Gc::new(GcCell::new(EnvironmentInternal::new(enclosing))))
    }

    /// Ambient lookup: walks the enclosing chain. Only the global frame is
    /// ever reached this way; resolved locals go through `get_at`.
    pub fn get(&self, name: &Token) -> Result<Gc<Object>> {
        self.0.borrow().get(name)
    }

    pub fn assign(&self, name: &Token, value: Gc<Object>) -> Result<()> {
        self.0.borrow_mut().assign(name, value)
    }

    /// Writes the current frame unconditionally. Lox permits redefining a
    /// name that is already bound.
    pub fn define(&self, name: &str, value: Gc<Object>) {
        self.0.borrow_mut().define(name, value)
    }

    fn ancestor(&self, distance: usize) -> Self {
        if distance == 0 {
            self.clone()
        } else {
            self.0
                .borrow()
                .enclosing
                .as_ref()
                .expect("Environment chain shorter than resolved distance.")
                .ancestor(distance - 1)
        }
    }

    pub fn get_at(&self, distance: usize, name: &str) -> Gc<Object> {
        self.ancestor(distance).0.borrow().get_at(name, distance)
    }

    pub fn assign_at(&self, distance: usize, name: &Token, value: Gc<Object>) {
        self.ancestor(distance)
            .0
            .borrow_mut()
            .assign_at(name, value);
    }
}

#[derive(Debug, Finalize, Trace)]
struct EnvironmentInternal {
    enclosing: Option<Environment>,
    values: HashMap<String, Gc<Object>>,
}

impl EnvironmentInternal {
    fn new(enclosing: Option<Environment>) -> Self {
        Self {
            enclosing,
            values: HashMap::new(),
        }
    }

    fn get(&self, name: &Token) -> Result<Gc<Object>> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.0.borrow().get(name);
        }

        Err(RuntimeError::new(
            Gc::new(name.clone()),
            &format!("Undefined variable '{}'.", name.lexeme),
        )
        .into())
    }

    fn assign(&mut self, name: &Token, value: Gc<Object>) -> Result<()> {
        if let Some(v) = self.values.get_mut(&name.lexeme) {
            *v = value;
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.0.borrow_mut().assign(name, value);
        }

        Err(RuntimeError::new(
            Gc::new(name.clone()),
            &format!("Undefined variable '{}'.", name.lexeme),
        )
        .into())
    }

    fn define(&mut self, name: &str, value: Gc<Object>) {
        self.values.insert(name.to_owned(), value);
    }

    fn get_at(&self, name: &str, distance: usize) -> Gc<Object> {
        self.values
            .get(name)
            .unwrap_or_else(|| {
                panic!("Didn't find local variable {name} at distance {distance}")
            })
            .clone()
    }

    fn assign_at(&mut self, name: &Token, value: Gc<Object>) {
        self.values.insert(name.lexeme.to_owned(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token_type::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::Identifier, name, Object::Nil, 1)
    }

    #[test]
    fn define_and_get() -> Result<()> {
        let env = Environment::new(None);
        env.define("x", Gc::new(Object::Number(1.0)));
        assert_eq!(*env.get(&ident("x"))?, Object::Number(1.0));
        Ok(())
    }

    #[test]
    fn get_walks_enclosing_chain() -> Result<()> {
        let global = Environment::new(None);
        global.define("x", Gc::new(Object::Number(1.0)));
        let inner = Environment::new(Some(global));
        assert_eq!(*inner.get(&ident("x"))?, Object::Number(1.0));
        Ok(())
    }

    #[test]
    fn shadowing_resolves_to_nearest_frame() -> Result<()> {
        let global = Environment::new(None);
        global.define("x", Gc::new(Object::Number(1.0)));
        let inner = Environment::new(Some(global.clone()));
        inner.define("x", Gc::new(Object::Number(2.0)));
        assert_eq!(*inner.get(&ident("x"))?, Object::Number(2.0));
        assert_eq!(*global.get(&ident("x"))?, Object::Number(1.0));
        Ok(())
    }

    #[test]
    fn get_at_hops_exact_distance() {
        let global = Environment::new(None);
        global.define("x", Gc::new(Object::Number(1.0)));
        let middle = Environment::new(Some(global));
        middle.define("x", Gc::new(Object::Number(2.0)));
        let inner = Environment::new(Some(middle));
        assert_eq!(*inner.get_at(1, "x"), Object::Number(2.0));
        assert_eq!(*inner.get_at(2, "x"), Object::Number(1.0));
    }

    #[test]
    fn assign_at_writes_exact_frame() {
        let global = Environment::new(None);
        global.define("x", Gc::new(Object::Number(1.0)));
        let inner = Environment::new(Some(global.clone()));
        inner.assign_at(1, &ident("x"), Gc::new(Object::Number(9.0)));
        assert_eq!(*global.get_at(0, "x"), Object::Number(9.0));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let env = Environment::new(None);
        let err = env.get(&ident("missing")).unwrap_err();
        let err = err.downcast_ref::<RuntimeError>().unwrap();
        assert_eq!(err.message, "Undefined variable 'missing'.");
    }

    #[test]
    fn assignment_mutates_shared_frame() -> Result<()> {
        let global = Environment::new(None);
        global.define("x", Gc::new(Object::Number(1.0)));
        let alias = global.clone();
        alias.assign(&ident("x"), Gc::new(Object::Number(5.0)))?;
        assert_eq!(*global.get(&ident("x"))?, Object::Number(5.0));
        Ok(())
    }
}
