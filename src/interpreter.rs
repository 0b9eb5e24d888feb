use crate::environment::Environment;
use crate::expr::{self, Expr};
use crate::lox_callable::{Clock, LoxCallable};
use crate::lox_class::LoxClass;
use crate::lox_function::LoxFunction;
use crate::lox_instance::LoxInstance;
use crate::lox_result::Result;
use crate::lox_return::Return;
use crate::object::Object::{
    self, Boolean as OBoolean, Callable as OCallable, Instance as OInstance, Nil as ONil,
    Number as ONumber, String as OString,
};
use crate::runtime_error::RuntimeError;
use crate::stmt::{self, Stmt};
use crate::token::Token;
use crate::token_type::TokenType as TT;

use std::collections::HashMap;
use std::io::Write;

use gc::{Finalize, Gc, GcCell, Trace};

#[derive(Clone, Finalize, Trace)]
pub enum InterpreterOutput {
    StdOut,
    ByteVec(Gc<GcCell<Vec<u8>>>),
}

#[derive(Finalize, Trace)]
pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    /// The resolver's side-table: AST node id to scope distance. References
    /// with no entry fall through to the globals.
    locals: HashMap<u128, usize>,
    output: InterpreterOutput,
}

impl Interpreter {
    pub fn new(output: InterpreterOutput) -> Self {
        let globals = Environment::new(None);

        globals.define(
            "clock",
            Gc::new(OCallable(Gc::new(LoxCallable::Clock(Clock::new())))),
        );

        Self {
            globals: globals.clone(),
            environment: globals,
            locals: HashMap::new(),
            output,
        }
    }

    pub fn interpret<F>(&mut self, statements: &[Stmt], mut error_handler: F)
    where
        F: FnMut(&RuntimeError),
    {
        for statement in statements {
            match self.execute(statement.clone()) {
                Ok(_) => {}
                Err(error) => {
                    (error_handler)(
                        error
                            .downcast_ref::<RuntimeError>()
                            .expect("Unexpected error"),
                    );
                    return;
                }
            }
        }
    }

    /// Called by the resolver for every local reference it pins down.
    pub fn resolve(&mut self, expr_id: u128, depth: usize) {
        self.locals.insert(expr_id, depth);
    }

    fn execute(&mut self, stmt: Stmt) -> Result<()> {
        match &stmt {
            Stmt::Block(s) => self.visit_block_stmt(s.clone()),
            Stmt::Class(s) => self.visit_class_stmt(s.clone()),
            Stmt::Expression(s) => self.visit_expression_stmt(s.clone()),
            Stmt::Function(s) => self.visit_function_stmt(s.clone()),
            Stmt::If(s) => self.visit_if_stmt(s.clone()),
            Stmt::Print(s) => self.visit_print_stmt(s.clone()),
            Stmt::Return(s) => self.visit_return_statement(s.clone()),
            Stmt::Var(s) => self.visit_var_stmt(s.clone()),
            Stmt::While(s) => self.visit_while_statement(s.clone()),
        }
    }

    /// Runs `statements` in `environment`, restoring the previous
    /// environment on every exit path, including return unwinds and
    /// runtime errors.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<()> {
        let previous = self.environment.clone();
        self.environment = environment;

        for statement in statements {
            let result = self.execute(statement.clone());
            if result.is_err() {
                self.environment = previous;
                return result;
            }
        }

        self.environment = previous;
        Ok(())
    }

    fn visit_block_stmt(&mut self, stmt: Gc<stmt::Block>) -> Result<()> {
        self.execute_block(
            &stmt.statements,
            Environment::new(Some(self.environment.clone())),
        )?;
        Ok(())
    }

    fn visit_class_stmt(&mut self, stmt: Gc<stmt::Class>) -> Result<()> {
        let superclass = match &stmt.superclass {
            Some(variable) => {
                let value = self.visit_variable_expr(variable.clone())?;
                match &*value {
                    OCallable(callable) => match &**callable {
                        LoxCallable::Class(class) => Some(Gc::clone(class)),
                        _ => {
                            return Err(RuntimeError::new(
                                variable.name.clone(),
                                "Superclass must be a class.",
                            )
                            .into())
                        }
                    },
                    _ => {
                        return Err(RuntimeError::new(
                            variable.name.clone(),
                            "Superclass must be a class.",
                        )
                        .into())
                    }
                }
            }
            None => None,
        };

        self.environment.define(&stmt.name.lexeme, Gc::new(ONil));

        // Methods of a subclass close over an extra frame binding `super`.
        let enclosing = self.environment.clone();
        if let Some(superclass) = &superclass {
            let environment = Environment::new(Some(self.environment.clone()));
            environment.define(
                "super",
                Gc::new(OCallable(Gc::new(LoxCallable::Class(Gc::clone(superclass))))),
            );
            self.environment = environment;
        }

        let mut methods = HashMap::new();
        for method in &stmt.methods {
            let function = LoxFunction::new(
                method.clone(),
                self.environment.clone(),
                method.name.lexeme == "init",
            );
            methods.insert(method.name.lexeme.clone(), function);
        }

        let class = LoxClass::new(&stmt.name.lexeme, superclass, methods);
        self.environment = enclosing;

        self.environment.assign(
            &stmt.name,
            Gc::new(OCallable(Gc::new(LoxCallable::Class(Gc::new(class))))),
        )?;
        Ok(())
    }

    fn evaluate(&mut self, expr: Expr) -> Result<Gc<Object>> {
        match &expr {
            Expr::Assign(ex) => self.visit_assign_expr(ex.clone()),
            Expr::Binary(ex) => self.visit_binary_expr(ex.clone()),
            Expr::Call(ex) => self.visit_call_expr(ex.clone()),
            Expr::Get(ex) => self.visit_get_expr(ex.clone()),
            Expr::Grouping(ex) => self.visit_grouping_expr(ex.clone()),
            Expr::Literal(ex) => self.visit_literal_expr(ex.clone()),
            Expr::Logical(ex) => self.visit_logical_expr(ex.clone()),
            Expr::Set(ex) => self.visit_set_expr(ex.clone()),
            Expr::Super(ex) => self.visit_super_expr(ex.clone()),
            Expr::This(ex) => self.visit_this_expr(ex.clone()),
            Expr::Unary(ex) => self.visit_unary_expr(ex.clone()),
            Expr::Variable(ex) => self.visit_variable_expr(ex.clone()),
        }
    }

    fn visit_expression_stmt(&mut self, stmt: Gc<stmt::Expression>) -> Result<()> {
        self.evaluate(stmt.expression.clone())?;
        Ok(())
    }

    fn visit_function_stmt(&mut self, stmt: Gc<stmt::Function>) -> Result<()> {
        let function = Gc::new(LoxCallable::Function(LoxFunction::new(
            stmt.clone(),
            self.environment.clone(),
            false,
        )));
        self.environment
            .define(&stmt.name.lexeme, Gc::new(OCallable(function)));
        Ok(())
    }

    fn visit_if_stmt(&mut self, stmt: Gc<stmt::If>) -> Result<()> {
        let condition = self.evaluate(stmt.condition.clone())?;
        if is_truthy(&condition) {
            self.execute(stmt.then_branch.clone())?;
        } else if let Some(else_branch) = stmt.else_branch.clone() {
            self.execute(else_branch)?;
        }
        Ok(())
    }

    fn visit_print_stmt(&mut self, stmt: Gc<stmt::Print>) -> Result<()> {
        let value = self.evaluate(stmt.expression.clone())?;
        match &self.output {
            InterpreterOutput::ByteVec(v) => writeln!(v.borrow_mut(), "{value}")?,
            InterpreterOutput::StdOut => println!("{value}"),
        }
        Ok(())
    }

    fn visit_return_statement(&mut self, stmt: Gc<stmt::Return>) -> Result<()> {
        let value = match &stmt.value {
            Some(expr) => self.evaluate(expr.clone())?,
            None => Gc::new(ONil),
        };

        Err(Return::new(value).into())
    }

    fn visit_var_stmt(&mut self, stmt: Gc<stmt::Var>) -> Result<()> {
        let value = if let Some(initializer) = stmt.initializer.clone() {
            self.evaluate(initializer)?
        } else {
            Gc::new(ONil)
        };

        self.environment.define(&stmt.name.lexeme, value);
        Ok(())
    }

    fn visit_while_statement(&mut self, stmt: Gc<stmt::While>) -> Result<()> {
        while {
            let condition = self.evaluate(stmt.condition.clone())?;
            is_truthy(&condition)
        } {
            self.execute(stmt.body.clone())?;
        }
        Ok(())
    }

    fn visit_assign_expr(&mut self, expr: Gc<expr::Assign>) -> Result<Gc<Object>> {
        let value = self.evaluate(expr.value.clone())?;

        if let Some(distance) = self.locals.get(&expr.id()) {
            self.environment
                .assign_at(*distance, &expr.name, Gc::clone(&value));
        } else {
            self.globals.assign(&expr.name, Gc::clone(&value))?;
        }

        Ok(value)
    }

    fn visit_binary_expr(&mut self, expr: Gc<expr::Binary>) -> Result<Gc<Object>> {
        let left = self.evaluate(expr.left.clone())?;
        let right = self.evaluate(expr.right.clone())?;

        let obj = match expr.operator.type_ {
            TT::BangEqual => OBoolean(!is_equal(&left, &right)),
            TT::EqualEqual => OBoolean(is_equal(&left, &right)),
            TT::Greater => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                OBoolean(l > r)
            }
            TT::GreaterEqual => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                OBoolean(l >= r)
            }
            TT::Less => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                OBoolean(l < r)
            }
            TT::LessEqual => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                OBoolean(l <= r)
            }
            TT::Minus => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                ONumber(l - r)
            }
            TT::Plus => match (left.as_ref(), right.as_ref()) {
                (ONumber(l), ONumber(r)) => ONumber(l + r),
                (OString(l), OString(r)) => OString(l.to_owned() + r.as_str()),
                _ => {
                    return Err(RuntimeError::new(
                        expr.operator.clone(),
                        "Operands must be two numbers or two strings.",
                    )
                    .into())
                }
            },
            // Division by zero follows IEEE-754: an infinity or NaN, not an
            // error.
            TT::Slash => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                ONumber(l / r)
            }
            TT::Star => {
                let (l, r) = check_number_operands(&expr.operator, &left, &right)?;
                ONumber(l * r)
            }
            _ => unreachable!(),
        };
        Ok(Gc::new(obj))
    }

    fn visit_call_expr(&mut self, expr: Gc<expr::Call>) -> Result<Gc<Object>> {
        let callee = self.evaluate(expr.callee.clone())?;

        let arguments = {
            let mut arguments = Vec::new();
            for argument in expr.arguments.clone() {
                arguments.push(self.evaluate(argument)?);
            }
            arguments
        };

        if let OCallable(function) = &*callee {
            if arguments.len() != function.arity() {
                Err(RuntimeError::new(
                    expr.paren.clone(),
                    &format!(
                        "Expected {} arguments but got {}.",
                        function.arity(),
                        arguments.len()
                    ),
                )
                .into())
            } else {
                Ok(function.call(self, &arguments)?)
            }
        } else {
            Err(RuntimeError::new(
                expr.paren.clone(),
                "Can only call functions and classes.",
            )
            .into())
        }
    }

    fn visit_get_expr(&mut self, expr: Gc<expr::Get>) -> Result<Gc<Object>> {
        let object = self.evaluate(expr.object.clone())?;

        if let OInstance(instance) = &*object {
            LoxInstance::get(instance, &expr.name)
        } else {
            Err(RuntimeError::new(expr.name.clone(), "Only instances have properties.").into())
        }
    }

    fn visit_grouping_expr(&mut self, expr: Gc<expr::Grouping>) -> Result<Gc<Object>> {
        self.evaluate(expr.expression.clone())
    }

    fn visit_literal_expr(&mut self, expr: Gc<expr::Literal>) -> Result<Gc<Object>> {
        Ok(expr.value.clone())
    }

    fn visit_logical_expr(&mut self, expr: Gc<expr::Logical>) -> Result<Gc<Object>> {
        let left = self.evaluate(expr.left.clone())?;

        match expr.operator.type_ {
            TT::Or => {
                if is_truthy(&left) {
                    return Ok(left);
                }
            }
            TT::And => {
                if !is_truthy(&left) {
                    return Ok(left);
                }
            }
            _ => unreachable!(),
        }

        self.evaluate(expr.right.clone())
    }

    fn visit_set_expr(&mut self, expr: Gc<expr::Set>) -> Result<Gc<Object>> {
        let object = self.evaluate(expr.object.clone())?;

        if let OInstance(instance) = &*object {
            let value = self.evaluate(expr.value.clone())?;
            instance.set(&expr.name, Gc::clone(&value));
            Ok(value)
        } else {
            Err(RuntimeError::new(expr.name.clone(), "Only instances have fields.").into())
        }
    }

    fn visit_super_expr(&mut self, expr: Gc<expr::Super>) -> Result<Gc<Object>> {
        let distance = *self
            .locals
            .get(&expr.id())
            .expect("Unresolved 'super' expression.");
        let superclass = self.environment.get_at(distance, "super");
        // The implicit `this` frame sits directly inside the `super` frame.
        let object = self.environment.get_at(distance - 1, "this");

        let superclass = match &*superclass {
            OCallable(callable) => match &**callable {
                LoxCallable::Class(class) => Gc::clone(class),
                _ => unreachable!("'super' is always bound to a class."),
            },
            _ => unreachable!("'super' is always bound to a class."),
        };
        let instance = match &*object {
            OInstance(instance) => Gc::clone(instance),
            _ => unreachable!("'this' is always bound to an instance."),
        };

        match superclass.find_method(&expr.method.lexeme) {
            Some(method) => Ok(Gc::new(OCallable(Gc::new(LoxCallable::Function(
                method.bind(instance),
            ))))),
            None => Err(RuntimeError::new(
                expr.method.clone(),
                &format!("Undefined property '{}'.", expr.method.lexeme),
            )
            .into()),
        }
    }

    fn visit_this_expr(&mut self, expr: Gc<expr::This>) -> Result<Gc<Object>> {
        self.look_up_variable(&expr.keyword, expr.id())
    }

    fn visit_unary_expr(&mut self, expr: Gc<expr::Unary>) -> Result<Gc<Object>> {
        let right = self.evaluate(expr.right.clone())?;

        match expr.operator.type_ {
            TT::Bang => Ok(Gc::new(OBoolean(!is_truthy(&right)))),
            TT::Minus => {
                let r = check_number_operand(&expr.operator, &right)?;
                Ok(Gc::new(ONumber(-r)))
            }
            _ => unreachable!(),
        }
    }

    fn visit_variable_expr(&mut self, expr: Gc<expr::Variable>) -> Result<Gc<Object>> {
        self.look_up_variable(&expr.name, expr.id())
    }

    fn look_up_variable(&self, name: &Token, expr_id: u128) -> Result<Gc<Object>> {
        if let Some(distance) = self.locals.get(&expr_id) {
            Ok(self.environment.get_at(*distance, &name.lexeme))
        } else {
            self.globals.get(name)
        }
    }
}

fn check_number_operand(operator: &Gc<Token>, operand: &Object) -> Result<f64> {
    if let ONumber(l) = operand {
        Ok(*l)
    } else {
        Err(RuntimeError::new(Gc::clone(operator), "Operand must be a number.").into())
    }
}

fn check_number_operands(
    operator: &Gc<Token>,
    left: &Object,
    right: &Object,
) -> Result<(f64, f64)> {
    if let (ONumber(l), ONumber(r)) = (left, right) {
        Ok((*l, *r))
    } else {
        Err(RuntimeError::new(Gc::clone(operator), "Operands must be numbers.").into())
    }
}

fn is_truthy(object: &Object) -> bool {
    match object {
        ONil => false,
        OBoolean(b) => *b,
        _ => true,
    }
}

fn is_equal(a: &Object, b: &Object) -> bool {
    match (a, b) {
        // `==` treats NaN as equal to itself, so equality is a proper
        // equivalence relation even though raw IEEE-754 disagrees.
        (ONumber(x), ONumber(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    use std::str;

    use gc::{Gc, GcCell};

    fn positive_interpreter_test(source: &str, expected_output: &str) -> Result<()> {
        let mut error_count = 0usize;

        let tokens = Scanner::new(source, |_, _| error_count += 1).scan_tokens();

        let statements = Parser::new(tokens, |_, _| {
            error_count += 1;
        })
        .parse()
        .unwrap();

        assert_eq!(error_count, 0);

        let output = Gc::new(GcCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(InterpreterOutput::ByteVec(output.clone()));

        Resolver::new(&mut interpreter, |_, _| error_count += 1)
            .resolve(&statements)?;
        assert_eq!(error_count, 0);

        interpreter.interpret(&statements, |_| error_count += 1);
        assert_eq!(error_count, 0);

        assert_eq!(str::from_utf8(&output.borrow())?, expected_output);

        Ok(())
    }

    fn runtime_error_test(
        source: &str,
        expected_message: &str,
        expected_line: usize,
    ) -> Result<()> {
        let mut error_count = 0usize;

        let tokens = Scanner::new(source, |_, _| error_count += 1).scan_tokens();

        let statements = Parser::new(tokens, |_, _| {
            error_count += 1;
        })
        .parse()
        .unwrap();

        assert_eq!(error_count, 0);

        let output = Gc::new(GcCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(InterpreterOutput::ByteVec(output));

        Resolver::new(&mut interpreter, |_, _| error_count += 1)
            .resolve(&statements)?;
        assert_eq!(error_count, 0);

        let mut runtime_error = None;
        interpreter.interpret(&statements, |e| {
            runtime_error = Some((e.message.clone(), e.token.line));
        });

        let (message, line) = runtime_error.expect("Expected a runtime error");
        assert_eq!(message, expected_message);
        assert_eq!(line, expected_line);

        Ok(())
    }

    #[test]
    fn evaluate() -> Result<()> {
        let mut error_count = 0usize;

        let tokens = vec![
            Token::new(TT::LeftParen, "(", Object::Nil, 1).into(),
            Token::new(TT::Number, "1", Object::Number(1.0), 1).into(),
            Token::new(TT::Plus, "+", Object::Nil, 1).into(),
            Token::new(TT::Number, "2", Object::Number(2.0), 1).into(),
            Token::new(TT::Minus, "-", Object::Nil, 1).into(),
            Token::new(TT::Number, "0.5", Object::Number(0.5), 1).into(),
            Token::new(TT::RightParen, ")", Object::Nil, 1).into(),
            Token::new(TT::Star, "*", Object::Nil, 1).into(),
            Token::new(TT::Minus, "-", Object::Nil, 1).into(),
            Token::new(TT::Number, "4", Object::Number(4.0), 1).into(),
            Token::new(TT::Semicolon, ";", Object::Nil, 1).into(),
            Token::new(TT::Eof, "", Object::Nil, 1).into(),
        ];

        let statements = Parser::new(tokens, |_, _| {
            error_count += 1;
        })
        .parse()
        .unwrap();

        assert_eq!(error_count, 0);

        let mut interpreter = Interpreter::new(InterpreterOutput::StdOut);

        if let Stmt::Expression(expr_statement) = &statements[0] {
            let res = interpreter.evaluate(expr_statement.expression.clone())?;
            assert_eq!(*res, Object::Number(-10.0));
        } else {
            panic!("Expected an expression statement");
        }
        Ok(())
    }

    #[test]
    fn precedence_arithmetic() -> Result<()> {
        positive_interpreter_test("print 1 + 2 * 3;", "7\n")
    }

    #[test]
    fn number_formatting() -> Result<()> {
        let source = r"
            print 3;
            print 3.5;
            print -0.5;
            print 1 / 0;
        ";
        positive_interpreter_test(source, "3\n3.5\n-0.5\ninf\n")
    }

    #[test]
    fn string_concatenation() -> Result<()> {
        positive_interpreter_test(r#"print "foo" + "bar";"#, "foobar\n")
    }

    #[test]
    fn equality_never_raises() -> Result<()> {
        let source = r#"
            print 1 == 1;
            print 1 == "1";
            print nil == nil;
            print nil != false;
            print "a" == "a";
        "#;
        positive_interpreter_test(source, "true\nfalse\ntrue\ntrue\ntrue\n")
    }

    #[test]
    fn truthiness() -> Result<()> {
        let source = r#"
            if (0) print "zero is truthy";
            if ("") print "empty string is truthy";
            if (nil) print "unreachable"; else print "nil is falsey";
            print !false;
            print !nil;
        "#;
        positive_interpreter_test(
            source,
            "zero is truthy\nempty string is truthy\nnil is falsey\ntrue\ntrue\n",
        )
    }

    #[test]
    fn lexical_scope() -> Result<()> {
        let source = r"
            var a = 3; print a;
            {
                var a = 5; print a;
                {
                    var a = 7; print a;
                }
                print a;
            }
            print a;
            {
                a = 1; print a;
            }
            print a;
        ";
        let expected_output = "3\n5\n7\n5\n3\n1\n1\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn resolution_is_static() -> Result<()> {
        // `show` keeps observing the global `a` even after a shadowing
        // declaration appears later in the block.
        let source = r#"
            var a = "global";
            {
                fun show() {
                    print a;
                }
                show();
                var a = "local";
                show();
            }
        "#;
        positive_interpreter_test(source, "global\nglobal\n")
    }

    #[test]
    fn if_else() -> Result<()> {
        let source = r#"
            if (true) print "foo"; else print "bar";
            if (false) print "foo"; else print "bar";
        "#;
        let expected_output = "foo\nbar\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn and_or() -> Result<()> {
        let source = r#"
            var a = "a" or "x"; print a;
            var b = nil or "b"; print b;
            var c = false and 3; print c;
            var d = true and "d"; print d;
        "#;
        let expected_output = "a\nb\nfalse\nd\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn short_circuit_skips_side_effects() -> Result<()> {
        let source = r"
            var x = 0;
            fun bump() { x = x + 1; return true; }
            var a = false and bump();
            print x;
            var b = true or bump();
            print x;
            var c = true and bump();
            print x;
        ";
        positive_interpreter_test(source, "0\n0\n1\n")
    }

    #[test]
    fn while_for() -> Result<()> {
        let source = r"
            var i = 0;
            while (i < 5) { print i; i = i + 1; }

            var a = 0;
            var temp;
            for (var b = 1; a < 60; b = temp + b) { print a; temp = a; a = b; }
        ";
        let expected_output = "0\n1\n2\n3\n4\n0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n55\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn for_with_missing_clauses() -> Result<()> {
        let source = r"
            var i = 0;
            for (; i < 3;) { print i; i = i + 1; }
        ";
        positive_interpreter_test(source, "0\n1\n2\n")
    }

    #[test]
    fn basic_fun() -> Result<()> {
        let source = r#"
            fun say_hi(first, last) {
                print "Hi, " + first + " " + last + "!";
            }

            say_hi("Foo", "Bar");
        "#;
        let expected_output = "Hi, Foo Bar!\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn function_display_and_implicit_nil() -> Result<()> {
        let source = r"
            fun noop() {}
            print noop;
            print noop();
        ";
        positive_interpreter_test(source, "<fn noop>\nnil\n")
    }

    #[test]
    fn fib() -> Result<()> {
        let source = r"
            fun fib(n) {
                if (n <= 1) return n;
                return fib(n - 2) + fib(n - 1);
            }

            for (var i = 0; i < 10; i = i + 1) {
                print fib(i);
            }
        ";
        let expected_output = "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn counter_closure() -> Result<()> {
        let source = r"
            fun make_counter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var counter = make_counter();
            print counter();
            print counter();
            print counter();
        ";
        let expected_output = "1\n2\n3\n";
        positive_interpreter_test(source, expected_output)
    }

    #[test]
    fn return_unwinds_nested_blocks() -> Result<()> {
        let source = r"
            fun f() {
                {
                    var x = 1;
                    while (true) {
                        return x;
                    }
                }
            }
            print f();
        ";
        positive_interpreter_test(source, "1\n")
    }

    #[test]
    fn clock_is_defined() -> Result<()> {
        positive_interpreter_test("print clock() > 0;", "true\n")
    }

    #[test]
    fn class_and_instance_display() -> Result<()> {
        let source = r"
            class Bagel {}
            print Bagel;
            print Bagel();
        ";
        positive_interpreter_test(source, "Bagel\nBagel instance\n")
    }

    #[test]
    fn fields_and_methods() -> Result<()> {
        let source = r#"
            class Breakfast {
                cook() {
                    print "Eggs a-fryin'!";
                }
            }
            var b = Breakfast();
            b.meat = "sausage";
            print b.meat;
            b.cook();
        "#;
        positive_interpreter_test(source, "sausage\nEggs a-fryin'!\n")
    }

    #[test]
    fn fields_shadow_methods() -> Result<()> {
        let source = r#"
            class C {
                m() { return "method"; }
            }
            var c = C();
            c.m = "field";
            print c.m;
        "#;
        positive_interpreter_test(source, "field\n")
    }

    #[test]
    fn this_binds_to_the_receiver() -> Result<()> {
        let source = r#"
            class Cake {
                taste() {
                    print "The " + this.flavor + " cake is delicious!";
                }
            }

            var cake = Cake();
            cake.flavor = "chocolate";
            cake.taste();
        "#;
        positive_interpreter_test(source, "The chocolate cake is delicious!\n")
    }

    #[test]
    fn bound_method_retains_receiver() -> Result<()> {
        let source = r#"
            class Person {
                say_name() {
                    print this.name;
                }
            }

            var jane = Person();
            jane.name = "Jane";
            var method = jane.say_name;
            method();
        "#;
        positive_interpreter_test(source, "Jane\n")
    }

    #[test]
    fn initializer_sets_fields() -> Result<()> {
        let source = r"
            class Point {
                init(x) {
                    this.x = x;
                }
            }
            var p = Point(42);
            print p.x;
        ";
        positive_interpreter_test(source, "42\n")
    }

    #[test]
    fn early_return_in_initializer_yields_instance() -> Result<()> {
        let source = r"
            class P {
                init() {
                    this.x = 1;
                    return;
                }
            }
            var p = P();
            print p.x;
            print p.init() == p;
        ";
        positive_interpreter_test(source, "1\ntrue\n")
    }

    #[test]
    fn inheritance_and_super() -> Result<()> {
        let source = r#"
            class A {
                speak() {
                    print "A";
                }
            }
            class B < A {
                speak() {
                    super.speak();
                    print "B";
                }
            }
            B().speak();
        "#;
        positive_interpreter_test(source, "A\nB\n")
    }

    #[test]
    fn methods_are_inherited() -> Result<()> {
        let source = r#"
            class Doughnut {
                cook() {
                    print "Fry until golden brown.";
                }
            }
            class BostonCream < Doughnut {}
            BostonCream().cook();
        "#;
        positive_interpreter_test(source, "Fry until golden brown.\n")
    }

    #[test]
    fn super_binds_statically() -> Result<()> {
        // `super` in A's method resolves against A's superclass even when
        // called through an instance of C.
        let source = r#"
            class Base {
                method() {
                    print "Base.method()";
                }
            }
            class A < Base {
                method() {
                    print "A.method()";
                }
                test() {
                    super.method();
                }
            }
            class C < A {}
            C().test();
        "#;
        positive_interpreter_test(source, "Base.method()\n")
    }

    #[test]
    fn add_number_to_string_is_an_error() -> Result<()> {
        runtime_error_test(
            r#"print "a" + 1;"#,
            "Operands must be two numbers or two strings.",
            1,
        )
    }

    #[test]
    fn comparison_requires_numbers() -> Result<()> {
        runtime_error_test(r#"print 1 < "two";"#, "Operands must be numbers.", 1)
    }

    #[test]
    fn negation_requires_a_number() -> Result<()> {
        runtime_error_test(r#"print -"oops";"#, "Operand must be a number.", 1)
    }

    #[test]
    fn undefined_variable_is_an_error() -> Result<()> {
        runtime_error_test("print missing;", "Undefined variable 'missing'.", 1)
    }

    #[test]
    fn undefined_assignment_target_is_an_error() -> Result<()> {
        runtime_error_test("missing = 1;", "Undefined variable 'missing'.", 1)
    }

    #[test]
    fn calling_a_non_callable_is_an_error() -> Result<()> {
        runtime_error_test(
            r#""not a function"();"#,
            "Can only call functions and classes.",
            1,
        )
    }

    #[test]
    fn arity_is_checked_at_the_call_site() -> Result<()> {
        let source = r"
            fun two(a, b) {}
            two(1);
        ";
        runtime_error_test(source, "Expected 2 arguments but got 1.", 3)
    }

    #[test]
    fn class_arity_follows_init() -> Result<()> {
        let source = r"
            class P {
                init(x, y) {}
            }
            P(1);
        ";
        runtime_error_test(source, "Expected 2 arguments but got 1.", 5)
    }

    #[test]
    fn property_access_requires_an_instance() -> Result<()> {
        runtime_error_test(
            "var x = 1; x.field;",
            "Only instances have properties.",
            1,
        )
    }

    #[test]
    fn property_assignment_requires_an_instance() -> Result<()> {
        runtime_error_test(
            "var x = 1; x.field = 2;",
            "Only instances have fields.",
            1,
        )
    }

    #[test]
    fn undefined_property_is_an_error() -> Result<()> {
        let source = r"
            class C {}
            C().missing;
        ";
        runtime_error_test(source, "Undefined property 'missing'.", 3)
    }

    #[test]
    fn undefined_super_method_is_an_error() -> Result<()> {
        let source = r"
            class A {}
            class B < A {
                m() {
                    super.missing();
                }
            }
            B().m();
        ";
        runtime_error_test(source, "Undefined property 'missing'.", 5)
    }

    #[test]
    fn superclass_must_be_a_class() -> Result<()> {
        let source = r#"
            var NotAClass = "so not a class";
            class Oops < NotAClass {}
        "#;
        runtime_error_test(source, "Superclass must be a class.", 3)
    }
}
