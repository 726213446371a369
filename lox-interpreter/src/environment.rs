use std::{
    collections::HashMap,
    rc::{Rc, Weak},
};

use lox_syntax::Token;

use crate::{
    errors::{Error, Result},
    value::Value,
};

/// Handle to one scope inside an [`Environments`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvId(usize);

// `None` marks a variable that was declared without an initializer
#[derive(Debug, Default)]
struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<EnvId>,
    // alive while some function value closes over this scope
    handle: Weak<EnvId>,
    released: bool,
}

impl Environment {
    fn closures(&self) -> impl Iterator<Item = EnvId> + '_ {
        self.values.values().filter_map(|value| match value {
            Some(Value::Callable(function)) => function.closure(),
            _ => None,
        })
    }
}

/// Every scope of one interpreter, parents linked by index.
///
/// Scopes are pushed when a block or call starts and released when it ends.
/// A scope only ever points at an older one, so the chain cannot cycle and a
/// child never outlives its parent. A released scope stays in the arena only
/// while a function value reachable from outside it still closes over it (or
/// over a newer scope); functions stored nowhere but in the released scopes
/// themselves do not count.
#[derive(Debug)]
pub struct Environments {
    scopes: Vec<Environment>,
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

impl Environments {
    pub const GLOBAL: EnvId = EnvId(0);

    pub fn new() -> Self {
        Self {
            scopes: vec![Environment::default()],
        }
    }

    pub fn push(&mut self, enclosing: EnvId) -> EnvId {
        self.scopes.push(Environment {
            enclosing: Some(enclosing),
            ..Environment::default()
        });
        EnvId(self.scopes.len() - 1)
    }

    /// Ends a scope. Frees it, and anything newer, unless a function value
    /// held somewhere else still refers to one of them.
    pub fn release(&mut self, id: EnvId) {
        let Some(scope) = self.scopes.get_mut(id.0) else {
            return;
        };
        scope.released = true;

        // everything newer has already ended, and so may older scopes kept
        // alive by a function that has since been dropped
        let mut start = id.0;
        while start > 0 && self.scopes[start - 1].released {
            start -= 1;
        }

        // handles owned by functions stored in the scopes being released
        let mut owned = vec![0; self.scopes.len() - start];
        for scope in &self.scopes[start..] {
            for closure in scope.closures() {
                if closure.0 >= start {
                    owned[closure.0 - start] += 1;
                }
            }
        }

        let mut keep = self.scopes[start..]
            .iter()
            .zip(&owned)
            .rposition(|(scope, owned)| scope.handle.strong_count() > *owned)
            .map_or(start, |offset| start + offset + 1);

        // a kept scope may hold a function over a newer one
        let mut i = start;
        while i < keep {
            for closure in self.scopes[i].closures() {
                keep = keep.max(closure.0 + 1);
            }
            i += 1;
        }

        self.scopes.truncate(keep);
    }

    /// Handle a function value holds on its defining scope. The scope is not
    /// freed by [`Environments::release`] while the handle is held outside it.
    pub fn capture(&mut self, id: EnvId) -> Rc<EnvId> {
        let scope = &mut self.scopes[id.0];
        if let Some(handle) = scope.handle.upgrade() {
            return handle;
        }

        let handle = Rc::new(id);
        scope.handle = Rc::downgrade(&handle);
        handle
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in exactly this scope, replacing a binding of the same name.
    pub fn define(&mut self, env: EnvId, name: &str, value: Option<Value>) {
        self.scopes[env.0].values.insert(name.to_string(), value);
    }

    pub fn get(&self, env: EnvId, name: &Token) -> Result<Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(slot) = scope.values.get(&name.lexeme) {
                return slot.clone().ok_or_else(|| {
                    Error::runtime_error(name, format!("Uninitialized variable '{}'", name.lexeme))
                });
            }
            current = scope.enclosing;
        }

        Err(Error::runtime_error(
            name,
            format!("Undefined variable '{}'", name.lexeme),
        ))
    }

    /// Overwrites the innermost existing binding of `name`.
    pub fn assign(&mut self, env: EnvId, name: &Token, value: Value) -> Result<()> {
        let mut current = Some(env);
        while let Some(id) = current {
            let scope = &mut self.scopes[id.0];
            if let Some(slot) = scope.values.get_mut(&name.lexeme) {
                *slot = Some(value);
                return Ok(());
            }
            current = scope.enclosing;
        }

        Err(Error::runtime_error(
            name,
            format!("Undefined variable '{}'", name.lexeme),
        ))
    }
}
