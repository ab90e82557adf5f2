// vim: tw=80
//! Proc Macros for use with replaymock
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the `replaymock` crate.
extern crate proc_macro;

mod stand_in;

/// Generate a stand-in for a trait.
///
/// The trait is emitted unchanged, followed by a struct whose name is the
/// trait's with `Mock` prepended.  The struct implements the trait by
/// forwarding every intercepted call to its `replaymock::Interceptor`.
///
/// * `#[stand_in]` describes an interface.  Methods with default bodies may be
///   intercepted, and run their body when they aren't.
/// * `#[stand_in(class)]` describes a class.  Inside it, `#[stand_in(final)]`
///   marks a method whose body always runs.
/// * `#[stand_in(class, final)]` describes a class that can't be mocked.
///   Creating its stand-in fails at runtime.
///
/// Methods without a receiver are never intercepted and must have a body.
///
/// # Examples
/// ```ignore
/// #[stand_in(class)]
/// trait Account {
///     fn balance(&self) -> i64;
///     fn overdrawn(&self) -> bool { self.balance() < 0 }
///     #[stand_in(final)]
///     fn currency(&self) -> &'static str { "EUR" }
///     fn bank_code() -> u32 { 2040 }
/// }
/// ```
#[proc_macro_attribute]
pub fn stand_in(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    stand_in::do_stand_in(attrs.into(), input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
