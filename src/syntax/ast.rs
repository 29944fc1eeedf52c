//! Declaration tree of a parsed `.hal` file.
//!
//! Only what resolution needs is kept: the package header, imports and the
//! nesting of named type declarations. Fields, methods and enum values are
//! not represented.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{FqName, TextRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Interface,
    Struct,
    Union,
    Enum,
    Typedef,
}

impl TypeKind {
    pub fn display(self) -> &'static str {
        match self {
            TypeKind::Interface => "interface",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Typedef => "typedef",
        }
    }

    /// Kinds whose bodies may declare nested types.
    pub fn is_scope(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Struct | TypeKind::Union)
    }
}

/// A named type declaration and the types declared inside it.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: SmolStr,
    pub kind: TypeKind,
    /// Range of the declared name.
    pub range: TextRange,
    /// Parent interface for `interface X extends Y`.
    pub extends: Option<FqName>,
    pub members: Scope,
}

impl TypeDecl {
    pub fn new(name: impl Into<SmolStr>, kind: TypeKind, range: TextRange) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            extends: None,
            members: Scope::default(),
        }
    }
}

/// Ordered set of declarations with unique names.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    decls: Vec<TypeDecl>,
    by_name: FxHashMap<SmolStr, usize>,
}

impl Scope {
    /// Add a declaration. Returns it back if the name is already taken.
    pub fn insert(&mut self, decl: TypeDecl) -> Result<(), TypeDecl> {
        if self.by_name.contains_key(&decl.name) {
            return Err(decl);
        }
        self.by_name.insert(decl.name.clone(), self.decls.len());
        self.decls.push(decl);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.by_name.get(name).map(|&idx| &self.decls[idx])
    }

    /// Walk a dotted path (`Outer.Inner`) through nested scopes.
    pub fn lookup_path(&self, path: &str) -> Option<&TypeDecl> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.members.get(segment)?;
        }
        Some(current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// One parsed source file.
#[derive(Clone, Debug)]
pub struct HalFile {
    /// Declared package and version (local name empty).
    pub package: FqName,
    /// Imports as written.
    pub imports: Vec<FqName>,
    pub root: Scope,
}

impl HalFile {
    /// The interface declared at the top level, if any.
    pub fn interface(&self) -> Option<&TypeDecl> {
        self.root.iter().find(|decl| decl.kind == TypeKind::Interface)
    }
}
