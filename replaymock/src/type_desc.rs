// vim: tw=80
//! Static descriptions of mockable types.
//!
//! `#[stand_in]` emits one `TypeDescription` per mocked trait, as a `static`.
//! Hand-written stand-ins can build theirs the same way, since every
//! constructor here is a `const fn`.
use crate::{
    error::{MockError, MockResult},
    value::ReturnKind,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    /// Every method is abstract or has an overridable default body
    Interface,
    /// Methods may carry real implementations, some of them final
    Class,
    /// A class that cannot be subclassed, and so cannot be mocked
    FinalClass,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    /// No real implementation; must be intercepted
    Abstract,
    /// Has a real implementation that interception may replace
    Overridable,
    /// Has a real implementation that always runs
    Final,
    /// Has no receiver, so there is no mock to intercept it on
    Static,
}

impl MethodKind {
    pub fn is_interceptable(self) -> bool {
        matches!(self, MethodKind::Abstract | MethodKind::Overridable)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MethodDescriptor {
    name: &'static str,
    signature: &'static str,
    kind: MethodKind,
    returns: ReturnKind,
}

impl MethodDescriptor {
    pub const fn new(name: &'static str,
                     signature: &'static str,
                     kind: MethodKind,
                     returns: ReturnKind) -> Self
    {
        MethodDescriptor { name, signature, kind, returns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The method's declaration, like `fn get(&self, index: usize) -> u32`
    pub fn signature(&self) -> &'static str {
        self.signature
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn returns(&self) -> ReturnKind {
        self.returns
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct TypeDescription {
    name: &'static str,
    kind: TypeKind,
    methods: &'static [MethodDescriptor],
}

impl TypeDescription {
    pub const fn new(name: &'static str,
                     kind: TypeKind,
                     methods: &'static [MethodDescriptor]) -> Self
    {
        TypeDescription { name, kind, methods }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn methods(&self) -> &'static [MethodDescriptor] {
        self.methods
    }

    pub fn method(&self, index: usize) -> Option<&'static MethodDescriptor> {
        self.methods.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// Decide which methods a new stand-in intercepts.
    ///
    /// Without `restricted`, every abstract and overridable method is
    /// intercepted.  With it, exactly the named methods are, and everything
    /// else runs its real implementation.
    pub fn select_methods(&self, restricted: Option<&[&str]>)
        -> MockResult<Box<[bool]>>
    {
        if self.kind == TypeKind::FinalClass {
            return Err(self.unmockable("final classes cannot be intercepted"));
        }
        let Some(restricted) = restricted else {
            return Ok(self.methods.iter()
                .map(|m| m.kind.is_interceptable())
                .collect());
        };
        let mut selected = vec![false; self.methods.len()];
        for name in restricted {
            let i = self.position(name)
                .ok_or_else(|| MockError::UnknownMethod {
                    type_name: self.name,
                    method: name.to_string()
                })?;
            let method = &self.methods[i];
            if !method.kind.is_interceptable() {
                let what = match method.kind {
                    MethodKind::Static => "static",
                    _ => "final"
                };
                return Err(self.unmockable(format!(
                    "method `{}` is {what} and cannot be overridden",
                    method.name)));
            }
            selected[i] = true;
        }
        let left_out = self.methods.iter()
            .zip(&selected)
            .find(|(m, sel)| m.kind == MethodKind::Abstract && !**sel);
        if let Some((method, _)) = left_out {
            return Err(self.unmockable(format!(
                "abstract method `{}` must be mocked, as it has no \
                 implementation to fall back on",
                method.name
            )));
        }
        Ok(selected.into_boxed_slice())
    }

    fn unmockable(&self, reason: impl Into<String>) -> MockError {
        MockError::UnmockableType {
            type_name: self.name,
            reason: reason.into()
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    static METHODS: [MethodDescriptor; 4] = [
        MethodDescriptor::new("size", "fn size(&self) -> usize",
                              MethodKind::Abstract, ReturnKind::Numeric),
        MethodDescriptor::new("foo", "fn foo(&self) -> i32",
                              MethodKind::Overridable, ReturnKind::Numeric),
        MethodDescriptor::new("id", "fn id(&self) -> u64",
                              MethodKind::Final, ReturnKind::Opaque),
        MethodDescriptor::new("create", "fn create() -> Self",
                              MethodKind::Static, ReturnKind::Opaque),
    ];
    static CLASS: TypeDescription =
        TypeDescription::new("Widget", TypeKind::Class, &METHODS);

    #[test]
    fn all_interceptable_by_default() {
        let sel = CLASS.select_methods(None).unwrap();
        assert_eq!(&[true, true, false, false][..], &sel[..]);
    }

    #[test]
    fn restricted() {
        let sel = CLASS.select_methods(Some(&["size"][..])).unwrap();
        assert_eq!(&[true, false, false, false][..], &sel[..]);
    }

    #[test]
    fn unknown_method() {
        let e = CLASS.select_methods(Some(&["size", "bar"][..])).unwrap_err();
        assert!(matches!(e, MockError::UnknownMethod{ref method, ..}
                         if method == "bar"), "{e:?}");
    }

    #[test]
    fn final_method() {
        let e = CLASS.select_methods(Some(&["size", "id"][..])).unwrap_err();
        assert_eq!("Widget cannot be mocked: method `id` is final and cannot \
                    be overridden", e.to_string());
    }

    #[test]
    fn static_method() {
        let e = CLASS.select_methods(Some(&["size", "create"][..])).unwrap_err();
        assert!(e.to_string().contains("`create` is static"), "{e}");
    }

    #[test]
    fn abstract_left_out() {
        let e = CLASS.select_methods(Some(&["foo"][..])).unwrap_err();
        assert!(e.to_string().contains("abstract method `size`"), "{e}");
    }

    #[test]
    fn final_class() {
        static FINAL: TypeDescription =
            TypeDescription::new("Sealed", TypeKind::FinalClass, &[]);
        let e = FINAL.select_methods(None).unwrap_err();
        assert!(matches!(e, MockError::UnmockableType{type_name: "Sealed", ..}));
    }
}
