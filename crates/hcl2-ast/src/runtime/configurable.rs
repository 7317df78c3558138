//! Capability interface implemented by host objects that receive
//! configuration events.
//!
//! Every capability is required. Hosts answer the keys they know and route
//! the rest to `Fallback`, which raises the standard "does not exist" errors
//! attributed to the host object.

use std::fmt;

use crate::error::ConfigurationError;
use crate::runtime::value::Value;

/// A callable a context exposes to function-call expressions.
pub trait Function {
    fn call(&self, args: &[Value]) -> Result<Value, ConfigurationError>;
}

impl<F> Function for F
where
    F: Fn(&[Value]) -> Result<Value, ConfigurationError>,
{
    fn call(&self, args: &[Value]) -> Result<Value, ConfigurationError> {
        self(args)
    }
}

pub trait Configurable: fmt::Debug {
    /// `key = value` inside this context.
    fn set_attribute(&mut self, attr: &str, value: Value) -> Result<(), ConfigurationError>;

    /// Resolves an identifier evaluated inside this context.
    fn get_attribute(&self, attr: &str) -> Result<Value, ConfigurationError>;

    /// Opens a nested block; the returned context receives the block's body.
    fn start_block(&mut self, name: &str, args: &[Value]) -> Result<Box<dyn Configurable>, ConfigurationError>;

    /// Hands back the fully populated child created by `start_block`.
    fn end_block(
        &mut self,
        name: &str,
        args: &[Value],
        block: Box<dyn Configurable>,
    ) -> Result<(), ConfigurationError>;

    fn get_function(&self, name: &str) -> Result<&dyn Function, ConfigurationError>;

    /// Post-population self-check. Never called by the interpreter itself;
    /// parents usually call it on the child from `end_block`.
    fn validate(&self) -> Result<(), ConfigurationError>;
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

/// The failing default of each capability, attributed to `context`.
#[derive(Clone, Copy)]
pub struct Fallback<'a> {
    context: &'a dyn fmt::Debug,
}

impl<'a> Fallback<'a> {
    pub fn of(context: &'a dyn fmt::Debug) -> Self {
        Self { context }
    }

    pub fn set_attribute(self, attr: &str, _value: Value) -> Result<(), ConfigurationError> {
        Err(self.missing("attribute", attr))
    }

    pub fn get_attribute(self, attr: &str) -> Result<Value, ConfigurationError> {
        Err(self.missing("attribute", attr))
    }

    pub fn start_block(self, name: &str, _args: &[Value]) -> Result<Box<dyn Configurable>, ConfigurationError> {
        Err(self.missing("block", name))
    }

    pub fn end_block(
        self,
        name: &str,
        _args: &[Value],
        _block: Box<dyn Configurable>,
    ) -> Result<(), ConfigurationError> {
        Err(self.missing("block", name))
    }

    pub fn get_function(self, name: &str) -> Result<&'static dyn Function, ConfigurationError> {
        Err(self.missing("function", name))
    }

    /// Nothing to check.
    pub fn validate(self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    fn missing(self, what: &str, name: &str) -> ConfigurationError {
        ConfigurationError::new(self.context, format!("{what} {name:?} does not exist"))
    }
}

/// A context with no capabilities at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bare;

impl Configurable for Bare {
    fn set_attribute(&mut self, attr: &str, value: Value) -> Result<(), ConfigurationError> {
        Fallback::of(self).set_attribute(attr, value)
    }

    fn get_attribute(&self, attr: &str) -> Result<Value, ConfigurationError> {
        Fallback::of(self).get_attribute(attr)
    }

    fn start_block(&mut self, name: &str, args: &[Value]) -> Result<Box<dyn Configurable>, ConfigurationError> {
        Fallback::of(self).start_block(name, args)
    }

    fn end_block(
        &mut self,
        name: &str,
        args: &[Value],
        block: Box<dyn Configurable>,
    ) -> Result<(), ConfigurationError> {
        Fallback::of(self).end_block(name, args, block)
    }

    fn get_function(&self, name: &str) -> Result<&dyn Function, ConfigurationError> {
        Fallback::of(self).get_function(name)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        Fallback::of(self).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_rejects_everything_by_name() {
        let mut bare = Bare;
        let msg = |e: ConfigurationError| e.message;

        assert_eq!(msg(bare.set_attribute("port", Value::from(1)).unwrap_err()), "attribute \"port\" does not exist");
        assert_eq!(msg(bare.get_attribute("host").unwrap_err()), "attribute \"host\" does not exist");
        assert_eq!(msg(bare.start_block("server", &[]).unwrap_err()), "block \"server\" does not exist");
        assert_eq!(msg(bare.end_block("server", &[], Box::new(Bare)).unwrap_err()), "block \"server\" does not exist");
        assert_eq!(msg(bare.get_function("upper").err().unwrap()), "function \"upper\" does not exist");
        assert!(bare.validate().is_ok());
    }

    #[test]
    fn fallback_names_the_host() {
        #[derive(Debug)]
        struct Server {
            port: u16,
        }
        let server = Server { port: 80 };
        let err = Fallback::of(&server).get_attribute("host").unwrap_err();
        assert_eq!(err.context, "Server { port: 80 }");
        assert_eq!(err.to_string(), "in context of object Server { port: 80 }: attribute \"host\" does not exist");
    }

    #[test]
    fn closures_are_functions() {
        let len = |args: &[Value]| -> Result<Value, ConfigurationError> { Ok(Value::from(args.len() as i64)) };
        let f: &dyn Function = &len;
        assert_eq!(f.call(&[Value::null(), Value::null()]), Ok(Value::from(2)));
    }
}
