// Execution context (spec §3, §4.3 / component C3).
//
// Contexts form a parent-linked stack indexed by depth, the way the
// teacher's `Env<T>` chains scopes — except a context's parent link is
// an id into an arena rather than a strong `Rc`, so that a
// `DeclaredFunction` can capture "the current scope" without creating an
// ownership cycle (closures that outlive their defining context simply
// find an empty arena slot and become detached; see §9 and
// SPEC_FULL.md §12.1).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::ast::NodeId;
use crate::error::{Error, Result};
use crate::value::Value;

pub type ContextId = usize;

/// A nonce minted at every call site so that a call's argument bindings
/// don't collide with a recursive activation's (§4.3).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionCallId {
    pub depth: usize,
    pub function_name: Rc<str>,
    pub nonce: u64,
}

impl FunctionCallId {
    fn namespaced(&self, param_name: &str) -> String {
        format!(
            "{}#{}@{}::{}",
            self.function_name, self.nonce, self.depth, param_name
        )
    }
}

#[derive(Clone, Debug)]
pub struct DeclaredVariable {
    pub name: Rc<str>,
    pub declared_type: Option<Rc<crate::ast::Node>>,
    pub constant: bool,
    pub origin: NodeId,
    value: RefCell<Value>,
    initialized: Cell<bool>,
}

impl DeclaredVariable {
    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Enforces the "exactly one write at declaration time" invariant
    /// for constants (§3).
    pub fn set(&self, value: Value) -> Result<()> {
        if self.constant && self.initialized.get() {
            return Err(Error::ConstantWrite(self.name.to_string()));
        }
        *self.value.borrow_mut() = value;
        self.initialized.set(true);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct DeclaredParameter {
    pub name: Rc<str>,
    pub declared_type: Option<Rc<crate::ast::Node>>,
    pub default: Option<Value>,
    pub constant: bool,
}

/// One entry in the lexical-scope stack. Owns its own variable,
/// parameter, and argument tables exclusively (§5); holds only an
/// *id* reference to its parent.
pub struct ExecutionContext {
    pub id: ContextId,
    pub depth: usize,
    pub parent: Option<ContextId>,
    variables: RefCell<HashMap<Rc<str>, Rc<DeclaredVariable>>>,
    parameters: RefCell<HashMap<Rc<str>, DeclaredParameter>>,
    arguments: RefCell<HashMap<String, Value>>,
    function_call_id: RefCell<Option<FunctionCallId>>,
}

impl ExecutionContext {
    fn new(id: ContextId, depth: usize, parent: Option<ContextId>) -> ExecutionContext {
        ExecutionContext {
            id,
            depth,
            parent,
            variables: RefCell::new(HashMap::new()),
            parameters: RefCell::new(HashMap::new()),
            arguments: RefCell::new(HashMap::new()),
            function_call_id: RefCell::new(None),
        }
    }

    pub fn function_call_id(&self) -> Option<FunctionCallId> {
        self.function_call_id.borrow().clone()
    }

    pub fn set_function_call_id(&self, id: FunctionCallId) {
        *self.function_call_id.borrow_mut() = Some(id);
    }

    /// Explicit declaration always creates in the current context only,
    /// and shadows the parent (§4.3). Raises on a duplicate name in the
    /// same context (§4.4).
    pub fn declare(
        &self,
        name: impl Into<Rc<str>>,
        declared_type: Option<Rc<crate::ast::Node>>,
        constant: bool,
        initial: Option<Value>,
        origin: NodeId,
    ) -> Result<()> {
        let name = name.into();
        if self.variables.borrow().contains_key(&name) {
            return Err(Error::DuplicateDeclaration(name.to_string()));
        }
        let var = DeclaredVariable {
            name: name.clone(),
            declared_type,
            constant,
            origin,
            value: RefCell::new(Value::None),
            initialized: Cell::new(false),
        };
        if let Some(v) = initial {
            var.set(v)?;
        }
        self.variables.borrow_mut().insert(name, Rc::new(var));
        Ok(())
    }

    pub fn declare_parameter(&self, param: DeclaredParameter) {
        self.parameters
            .borrow_mut()
            .insert(param.name.clone(), param);
    }

    pub fn bind_argument(&self, call_id: &FunctionCallId, param_name: &str, value: Value) {
        self.arguments
            .borrow_mut()
            .insert(call_id.namespaced(param_name), value);
    }

    fn local_variable(&self, name: &str) -> Option<Rc<DeclaredVariable>> {
        self.variables.borrow().get(name).cloned()
    }
}

/// Owns every live `ExecutionContext`, indexed by a monotonically
/// increasing id that is never reused — this is what lets a captured
/// context become "detached" instead of dangling (§9).
pub struct ContextArena {
    slots: RefCell<Vec<Option<Rc<ExecutionContext>>>>,
    nonce: Cell<u64>,
}

impl ContextArena {
    pub fn new() -> ContextArena {
        let arena = ContextArena {
            slots: RefCell::new(Vec::new()),
            nonce: Cell::new(0),
        };
        let root = ExecutionContext::new(0, 0, None);
        arena.slots.borrow_mut().push(Some(Rc::new(root)));
        arena
    }

    pub fn root(&self) -> ContextId {
        0
    }

    pub fn get(&self, id: ContextId) -> Option<Rc<ExecutionContext>> {
        self.slots.borrow().get(id).cloned().flatten()
    }

    /// Pushes a new child context onto `parent`.
    pub fn push_child(&self, parent: ContextId) -> Result<ContextId> {
        let parent_ctx = self
            .get(parent)
            .ok_or(Error::InternalBug("push_child: parent context is detached"))?;
        let mut slots = self.slots.borrow_mut();
        let id = slots.len();
        slots.push(Some(Rc::new(ExecutionContext::new(
            id,
            parent_ctx.depth + 1,
            Some(parent),
        ))));
        trace!(context_id = id, depth = parent_ctx.depth + 1, "push context");
        Ok(id)
    }

    /// Pushes a parentless context, for a call into a closure whose
    /// captured context has already been retired (§9, SPEC_FULL.md
    /// §12.1): the call still runs, but with no parent to fall back to,
    /// so any name that isn't a parameter or argument of this very call
    /// resolves to `Undefined` instead of reading stale state.
    pub fn push_orphan(&self) -> ContextId {
        let mut slots = self.slots.borrow_mut();
        let id = slots.len();
        slots.push(Some(Rc::new(ExecutionContext::new(id, 0, None))));
        trace!(context_id = id, "push orphan context (detached closure)");
        id
    }

    /// Mints a globally-unique-per-process function-call id (§4.3).
    pub fn next_function_call_id(&self, depth: usize, function_name: Rc<str>) -> FunctionCallId {
        let nonce = self.nonce.get();
        self.nonce.set(nonce + 1);
        FunctionCallId {
            depth,
            function_name,
            nonce,
        }
    }

    /// Closes a block or call context and frees its arena slot (§4.3, §9).
    pub fn retire(&self, id: ContextId) -> Result<()> {
        self.get(id)
            .ok_or(Error::InternalBug("retire: context already detached"))?;
        trace!(context_id = id, "retire context");
        self.slots.borrow_mut()[id] = None;
        Ok(())
    }

    /// Looks up an identifier through the context chain, per §4.4:
    /// arguments of the current call, then parameters of the current
    /// declared function, then variables (walking to the nearest
    /// binding).
    pub fn lookup(&self, id: ContextId, name: &str) -> Option<Value> {
        let ctx = self.get(id)?;

        if let Some(call_id) = ctx.function_call_id() {
            let key = call_id.namespaced(name);
            if let Some(v) = ctx.arguments.borrow().get(&key) {
                return Some(v.clone());
            }
        }

        if let Some(param) = ctx.parameters.borrow().get(name) {
            if let Some(default) = &param.default {
                return Some(default.clone());
            }
        }

        if let Some(var) = ctx.local_variable(name) {
            return Some(var.get());
        }

        match ctx.parent {
            Some(parent) => self.lookup(parent, name),
            None => None,
        }
    }

    /// Writes target the nearest existing binding or, absent one,
    /// create a new binding in `id`'s own context (§4.3).
    pub fn assign(&self, id: ContextId, name: &str, value: Value) -> Result<()> {
        if let Some(owner) = self.find_variable_owner(id, name) {
            owner.set(value)
        } else {
            let ctx = self
                .get(id)
                .ok_or(Error::InternalBug("assign: context is detached"))?;
            ctx.declare(name, None, false, Some(value), 0)
        }
    }

    fn find_variable_owner(&self, id: ContextId, name: &str) -> Option<Rc<DeclaredVariable>> {
        let ctx = self.get(id)?;
        if let Some(var) = ctx.local_variable(name) {
            return Some(var);
        }
        match ctx.parent {
            Some(parent) => self.find_variable_owner(parent, name),
            None => None,
        }
    }
}

impl Default for ContextArena {
    fn default() -> Self {
        ContextArena::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_then_lookup() {
        let arena = ContextArena::new();
        let root = arena.root();
        let ctx = arena.get(root).unwrap();
        ctx.declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        assert_eq!(arena.lookup(root, "x"), Some(Value::Bool(true)));
    }

    #[test]
    fn child_reads_through_to_parent() {
        let arena = ContextArena::new();
        let root = arena.root();
        arena
            .get(root)
            .unwrap()
            .declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        let child = arena.push_child(root).unwrap();
        assert_eq!(arena.lookup(child, "x"), Some(Value::Bool(true)));
    }

    #[test]
    fn declaration_shadows_parent_without_mutating_it() {
        let arena = ContextArena::new();
        let root = arena.root();
        arena
            .get(root)
            .unwrap()
            .declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        let child = arena.push_child(root).unwrap();
        arena
            .get(child)
            .unwrap()
            .declare("x", None, false, Some(Value::Bool(false)), 0)
            .unwrap();
        assert_eq!(arena.lookup(child, "x"), Some(Value::Bool(false)));
        assert_eq!(arena.lookup(root, "x"), Some(Value::Bool(true)));
    }

    #[test]
    fn assignment_targets_nearest_existing_binding() {
        let arena = ContextArena::new();
        let root = arena.root();
        arena
            .get(root)
            .unwrap()
            .declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        let child = arena.push_child(root).unwrap();
        arena.assign(child, "x", Value::Bool(false)).unwrap();
        assert_eq!(arena.lookup(root, "x"), Some(Value::Bool(false)));
    }

    #[test]
    fn duplicate_declaration_in_same_context_raises() {
        let arena = ContextArena::new();
        let root = arena.root();
        let ctx = arena.get(root).unwrap();
        ctx.declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        let err = ctx.declare("x", None, false, Some(Value::Bool(false)), 0);
        assert!(matches!(err, Err(Error::DuplicateDeclaration(_))));
    }

    #[test]
    fn constant_rejects_second_write() {
        let arena = ContextArena::new();
        let root = arena.root();
        arena
            .get(root)
            .unwrap()
            .declare("pi", None, true, Some(Value::Bool(true)), 0)
            .unwrap();
        let err = arena.assign(root, "pi", Value::Bool(false));
        assert!(matches!(err, Err(Error::ConstantWrite(_))));
    }

    #[test]
    fn retiring_a_context_detaches_it() {
        let arena = ContextArena::new();
        let root = arena.root();
        let child = arena.push_child(root).unwrap();
        arena.retire(child).unwrap();
        assert!(arena.get(child).is_none());
    }

    #[test]
    fn orphan_context_has_no_parent_and_does_not_see_root_bindings() {
        let arena = ContextArena::new();
        let root = arena.root();
        arena
            .get(root)
            .unwrap()
            .declare("x", None, false, Some(Value::Bool(true)), 0)
            .unwrap();
        let orphan = arena.push_orphan();
        assert_eq!(arena.get(orphan).unwrap().parent, None);
        assert_eq!(arena.lookup(orphan, "x"), None);
    }
}
