//! Cancellation scopes: a tree of owners whose cleanups run when the owner
//! is cancelled, children first.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Unknown scope {0:?}")]
    UnknownScope(ScopeId),

    #[error("{} cleanup(s) failed while cancelling scope", .0.len())]
    Aggregate(Vec<anyhow::Error>),
}

type Cleanup = Box<dyn FnOnce() -> anyhow::Result<()>>;

struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    cleanups: Vec<Cleanup>,
    active: bool,
}

/// Owns every scope. Cancelled scopes stay in the arena as inactive slots.
#[derive(Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: None,
            children: Vec::new(),
            cleanups: Vec::new(),
            active: true,
        });
        id
    }

    fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope, ScopeError> {
        self.scopes.get_mut(id.0).ok_or(ScopeError::UnknownScope(id))
    }

    pub fn is_active(&self, id: ScopeId) -> bool {
        self.scopes.get(id.0).is_some_and(|scope| scope.active)
    }

    /// Make `child` owned by `parent`. Attaching to a cancelled parent cancels
    /// the child right away.
    pub fn attach(&mut self, parent: ScopeId, child: ScopeId) -> Result<(), ScopeError> {
        self.scope_mut(child)?;
        if !self.is_active(parent) {
            self.scope_mut(parent)?;
            return self.cancel(child);
        }
        self.detach(child)?;
        self.scope_mut(parent)?.children.push(child);
        self.scope_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn detach(&mut self, child: ScopeId) -> Result<(), ScopeError> {
        if let Some(parent) = self.scope_mut(child)?.parent.take() {
            self.scope_mut(parent)?.children.retain(|id| *id != child);
        }
        Ok(())
    }

    /// Register a cleanup. On an already cancelled scope it runs immediately.
    pub fn on_cancel(
        &mut self,
        id: ScopeId,
        cleanup: impl FnOnce() -> anyhow::Result<()> + 'static,
    ) -> Result<(), ScopeError> {
        let scope = self.scope_mut(id)?;
        if scope.active {
            scope.cleanups.push(Box::new(cleanup));
            return Ok(());
        }
        cleanup().map_err(|error| ScopeError::Aggregate(vec![error]))
    }

    /// Cancel a scope and everything it owns. Every cleanup runs even when
    /// some fail; the failures are returned together.
    pub fn cancel(&mut self, id: ScopeId) -> Result<(), ScopeError> {
        let mut errors = Vec::new();
        self.cancel_into(id, &mut errors)?;
        self.detach(id)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScopeError::Aggregate(errors))
        }
    }

    fn cancel_into(&mut self, id: ScopeId, errors: &mut Vec<anyhow::Error>) -> Result<(), ScopeError> {
        let scope = self.scope_mut(id)?;
        if !scope.active {
            return Ok(());
        }
        scope.active = false;
        let children = std::mem::take(&mut scope.children);
        let cleanups = std::mem::take(&mut scope.cleanups);
        for child in children {
            self.cancel_into(child, errors)?;
            self.scope_mut(child)?.parent = None;
        }
        // Last registered runs first.
        for cleanup in cleanups.into_iter().rev() {
            if let Err(error) = cleanup() {
                errors.push(error);
            }
        }
        Ok(())
    }
}
