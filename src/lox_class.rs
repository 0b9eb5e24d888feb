use crate::interpreter::Interpreter;
use crate::lox_function::LoxFunction;
use crate::lox_instance::LoxInstance;
use crate::lox_result::Result;
use crate::object::Object;
use crate::unique_id::unique_u128;

use std::collections::HashMap;
use std::fmt;

use gc::{Finalize, Gc, Trace};

#[derive(Debug, Finalize, Trace)]
pub struct LoxClass {
    name: String,
    superclass: Option<Gc<LoxClass>>,
    methods: HashMap<String, LoxFunction>,
    id: u128,
}

impl LoxClass {
    pub fn new(
        name: &str,
        superclass: Option<Gc<LoxClass>>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            superclass,
            methods,
            id: unique_u128(),
        }
    }

    pub fn find_method(&self, name: &str) -> Option<LoxFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class's arity is its initializer's, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Calling a class allocates an instance and runs `init` bound to it,
    /// when one exists anywhere on the superclass chain.
    pub fn call(
        class: &Gc<LoxClass>,
        interpreter: &mut Interpreter,
        arguments: &[Gc<Object>],
    ) -> Result<Gc<Object>> {
        let instance = Gc::new(LoxInstance::new(Gc::clone(class)));
        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Gc::clone(&instance))
                .call(interpreter, arguments)?;
        }
        Ok(Gc::new(Object::Instance(instance)))
    }

    pub fn id(&self) -> u128 {
        self.id
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for LoxClass {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
