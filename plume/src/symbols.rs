//! Symbol interning and variable storage
//!
//! One [`Context`] per compilation unit. It owns the name ↔ [`VarId`]
//! mapping and the storage slot bound to each variable; the slot's width is
//! what the type checker reads back as the variable's static type.

use std::collections::HashMap;

use crate::ast::{Type, VarId};

/// Interns variable names to small, stable identifiers
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    ids: HashMap<String, VarId>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the identifier for `name`
    pub fn intern(&mut self, name: &str) -> VarId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = VarId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an identifier without creating one
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.ids.get(name).copied()
    }

    /// Reverse lookup
    pub fn name_of(&self, id: VarId) -> Option<&str> {
        self.names.get(id.index()).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All interned names in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (VarId(i as u32), name.as_str()))
    }
}

/// Storage width of a variable slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    I1,
    I32,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::I1 => 1,
            Width::I32 => 32,
        }
    }

    /// Width used to store a value of the given type
    pub fn from_type(ty: Type) -> Option<Width> {
        match ty {
            Type::Boolean => Some(Width::I1),
            Type::Integer => Some(Width::I32),
            Type::Untyped | Type::Error => None,
        }
    }

    /// Static type recovered from a storage width
    pub fn value_type(self) -> Type {
        if self.bits() == 1 {
            Type::Boolean
        } else {
            Type::Integer
        }
    }
}

/// Addressable storage location bound to one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: VarId,
    pub width: Width,
}

/// Maps variable identifiers to their storage slots
#[derive(Debug, Clone, Default)]
pub struct Storage {
    slots: HashMap<VarId, Slot>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) the slot for `id`
    pub fn bind(&mut self, id: VarId, width: Width) {
        self.slots.insert(id, Slot { id, width });
    }

    pub fn storage_of(&self, id: VarId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    /// All slots ordered by identifier
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self.slots.values().copied().collect();
        slots.sort_by_key(|slot| slot.id);
        slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Compilation context: symbol table plus storage for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub symbols: SymbolTable,
    pub storage: Storage,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name` and bind it to a slot of the given width
    pub fn declare(&mut self, name: &str, width: Width) -> VarId {
        let id = self.symbols.intern(name);
        self.storage.bind(id, width);
        id
    }

    /// Static type of a variable, read from its storage width.
    ///
    /// A variable without a storage slot has no usable type and checks as
    /// [`Type::Error`].
    pub fn type_of_var(&self, id: VarId) -> Type {
        self.storage
            .storage_of(id)
            .map(|slot| slot.width.value_type())
            .unwrap_or(Type::Error)
    }

    /// Display name of a variable; falls back to `v<id>` for unnamed handles
    pub fn display_name(&self, id: VarId) -> String {
        self.symbols
            .name_of(id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("v{}", id))
    }
}
