use crate::lox_callable::LoxCallable;
use crate::lox_class::LoxClass;
use crate::lox_result::Result;
use crate::object::Object;
use crate::runtime_error::RuntimeError;
use crate::token::Token;

use std::collections::HashMap;
use std::fmt;

use gc::{Finalize, Gc, GcCell, Trace};

#[derive(Debug, Finalize, Trace)]
pub struct LoxInstance {
    class: Gc<LoxClass>,
    fields: GcCell<HashMap<String, Gc<Object>>>,
}

impl LoxInstance {
    pub fn new(class: Gc<LoxClass>) -> Self {
        Self {
            class,
            fields: GcCell::new(HashMap::new()),
        }
    }

    /// Fields shadow methods of the same name; a method hit produces a
    /// fresh function bound to this instance. Takes the `Gc` handle so the
    /// bound method can capture it.
    pub fn get(instance: &Gc<LoxInstance>, name: &Token) -> Result<Gc<Object>> {
        if let Some(value) = instance.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.class.find_method(&name.lexeme) {
            let bound = method.bind(Gc::clone(instance));
            return Ok(Gc::new(Object::Callable(Gc::new(LoxCallable::Function(
                bound,
            )))));
        }

        Err(RuntimeError::new(
            Gc::new(name.clone()),
            &format!("Undefined property '{}'.", name.lexeme),
        )
        .into())
    }

    /// Setting always writes a field, never a method.
    pub fn set(&self, name: &Token, value: Gc<Object>) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} instance", self.class)
    }
}
