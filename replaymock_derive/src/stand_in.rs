// vim: tw=80
use proc_macro2::{Span, TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{
    ext::IdentExt,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, FnArg, Ident, ItemTrait, Pat, ReturnType,
    Signature, Token, TraitItem, TraitItemFn, Type, TypeParamBound,
};

/// Arguments of the `#[stand_in(..)]` attribute on a trait
#[derive(Debug, Default, Eq, PartialEq)]
struct Attrs {
    class: bool,
    is_final: bool,
}

impl Parse for Attrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = Attrs::default();
        let words = Punctuated::<Ident, Token![,]>::parse_terminated_with(
            input, Ident::parse_any)?;
        for word in words {
            if word == "class" {
                attrs.class = true;
            } else if word == "final" {
                attrs.is_final = true;
            } else {
                return Err(Error::new(word.span(),
                    "expected `class` or `final`"));
            }
        }
        if attrs.is_final && !attrs.class {
            return Err(Error::new(Span::call_site(),
                "only a class can be final; use `#[stand_in(class, final)]`"));
        }
        Ok(attrs)
    }
}

impl Attrs {
    fn type_kind(&self) -> Ident {
        match (self.class, self.is_final) {
            (true, true) => format_ident!("FinalClass"),
            (true, false) => format_ident!("Class"),
            (false, _) => format_ident!("Interface"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Kind {
    Abstract,
    Overridable,
    Final,
    Static,
}

impl Kind {
    fn is_interceptable(self) -> bool {
        matches!(self, Kind::Abstract | Kind::Overridable)
    }

    fn ident(self) -> Ident {
        match self {
            Kind::Abstract => format_ident!("Abstract"),
            Kind::Overridable => format_ident!("Overridable"),
            Kind::Final => format_ident!("Final"),
            Kind::Static => format_ident!("Static"),
        }
    }
}

/// One method of the trait, with the helper attributes already removed
struct Method {
    index: usize,
    kind: Kind,
    item: TraitItemFn,
}

impl Method {
    /// The type handed to `on_invoke`
    fn return_type(&self) -> TokenStream {
        match &self.item.sig.output {
            ReturnType::Default => quote!(()),
            ReturnType::Type(_, ty) => ty.to_token_stream(),
        }
    }

    fn descriptor(&self) -> TokenStream {
        let name = self.item.sig.ident.to_string();
        let signature = signature_string(&self.item.sig);
        let kind = self.kind.ident();
        let returns = if self.kind.is_interceptable() {
            let ty = self.return_type();
            quote!(<#ty as ::replaymock::DefaultReturn>::KIND)
        } else {
            quote!(::replaymock::ReturnKind::Opaque)
        };
        quote!(::replaymock::MethodDescriptor::new(#name, #signature,
            ::replaymock::MethodKind::#kind, #returns))
    }

    /// The method's implementation on the stand-in, or nothing if the trait's
    /// own body should always run.
    fn gen_impl(&self) -> TokenStream {
        if !self.kind.is_interceptable() {
            return TokenStream::new();
        }
        let index = self.index;
        let ty = self.return_type();
        let (bindings, args) = gen_arguments(&self.item.sig);
        let n = args.len();
        let invoke = quote!(
            #(#bindings)*
            let __args: [&dyn ::replaymock::Argument; #n] = [#(#args),*];
            self.interceptor.on_invoke::<#ty>(#index, &__args)
        );
        match &self.item.default {
            Some(body) => {
                let sig = &self.item.sig;
                quote!(
                    #sig {
                        if self.interceptor.intercepts(#index) {
                            return { #invoke };
                        }
                        #body
                    }
                )
            }
            None => {
                let sig = demutify(&self.item.sig);
                quote!(#sig { #invoke })
            }
        }
    }
}

/// Remove the per-method `#[stand_in(..)]` helpers from `attrs`.  Returns
/// whether one of them was `final`.
fn take_helper_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<bool> {
    let mut is_final = false;
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if !attr.path().is_ident("stand_in") {
            kept.push(attr);
            continue;
        }
        let word = attr.parse_args_with(Ident::parse_any)?;
        if word != "final" {
            return Err(Error::new(word.span(), "expected `final`"));
        }
        is_final = true;
    }
    *attrs = kept;
    Ok(is_final)
}

fn mentions_self(tokens: TokenStream) -> bool {
    tokens.into_iter().any(|tt| match tt {
        TokenTree::Ident(ident) => ident == "Self",
        TokenTree::Group(group) => mentions_self(group.stream()),
        _ => false
    })
}

/// Reject argument and return types that can't cross the interception
/// boundary.
fn check_types(sig: &Signature) -> syn::Result<()> {
    for input in sig.inputs.iter() {
        let FnArg::Typed(pt) = input else { continue };
        match &*pt.pat {
            Pat::Ident(pi) if pi.by_ref.is_none() && pi.subpat.is_none() => (),
            _ => return Err(Error::new(pt.pat.span(),
                "intercepted methods' arguments must be plain identifiers"))
        }
        if let Type::ImplTrait(_) = &*pt.ty {
            return Err(Error::new(pt.ty.span(),
                "`impl Trait` arguments are not supported"));
        }
        if mentions_self(pt.ty.to_token_stream()) {
            return Err(Error::new(pt.ty.span(),
                "intercepted methods can't take `Self` as an argument"));
        }
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        match &**ty {
            Type::Reference(r) if r.lifetime.as_ref()
                .map(|lt| lt.ident != "static")
                .unwrap_or(true) =>
            {
                return Err(Error::new(ty.span(),
                    "intercepted methods may only return 'static references"));
            }
            Type::ImplTrait(_) => {
                return Err(Error::new(ty.span(),
                    "`impl Trait` return types are not supported"));
            }
            _ => ()
        }
        if mentions_self(ty.to_token_stream()) {
            return Err(Error::new(ty.span(),
                "intercepted methods can't return `Self`"));
        }
    }
    Ok(())
}

fn classify(index: usize, mut item: TraitItemFn, class: bool)
    -> syn::Result<Method>
{
    let is_final = take_helper_attrs(&mut item.attrs)?;
    let sig = &item.sig;
    if !sig.generics.params.is_empty() {
        return Err(Error::new(sig.generics.span(),
            "generic methods are not supported"));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(Error::new(asyncness.span(),
            "async methods are not supported"));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(Error::new(variadic.span(),
            "variadic methods are not supported"));
    }
    let kind = match sig.receiver() {
        None if item.default.is_none() => {
            return Err(Error::new(sig.ident.span(),
                "methods without a receiver can't be intercepted, so they \
                 need a default body"));
        }
        None => Kind::Static,
        Some(r) if r.colon_token.is_some() => {
            return Err(Error::new(r.span(),
                "only `self`, `&self` and `&mut self` receivers are supported"));
        }
        Some(_) if is_final => {
            if !class {
                return Err(Error::new(sig.ident.span(),
                    "only methods of a `#[stand_in(class)]` trait can be final"));
            }
            if item.default.is_none() {
                return Err(Error::new(sig.ident.span(),
                    "a final method needs a default body"));
            }
            Kind::Final
        }
        Some(_) if item.default.is_none() => Kind::Abstract,
        Some(_) => Kind::Overridable,
    };
    if kind.is_interceptable() {
        check_types(sig)?;
    }
    Ok(Method { index, kind, item })
}

/// Build the expressions that hand each argument to the interceptor as a
/// `&dyn Argument`.  Borrowed strings and slices are copied into owned
/// bindings first.
fn gen_arguments(sig: &Signature) -> (Vec<TokenStream>, Vec<TokenStream>) {
    let mut bindings = Vec::new();
    let mut args = Vec::new();
    for input in sig.inputs.iter() {
        let FnArg::Typed(pt) = input else { continue };
        let Pat::Ident(pi) = &*pt.pat else { continue };
        let ident = &pi.ident;
        match &*pt.ty {
            Type::Reference(r) => match &*r.elem {
                Type::Path(tp) if tp.path.is_ident("str") => {
                    bindings.push(quote!(
                        let #ident = ::std::string::String::from(#ident);));
                    args.push(quote!(&#ident));
                }
                Type::Slice(_) => {
                    bindings.push(quote!(let #ident = #ident.to_vec();));
                    args.push(quote!(&#ident));
                }
                _ if r.mutability.is_some() => args.push(quote!(&*#ident)),
                _ => args.push(quote!(#ident)),
            },
            _ => args.push(quote!(&#ident)),
        }
    }
    (bindings, args)
}

/// Drop `mut` from argument patterns, for implementations that never touch
/// their arguments except to record them.
fn demutify(sig: &Signature) -> Signature {
    let mut sig = sig.clone();
    for input in sig.inputs.iter_mut() {
        if let FnArg::Typed(pt) = input {
            if let Pat::Ident(pi) = &mut *pt.pat {
                pi.mutability = None;
            }
        }
    }
    sig
}

/// Render a method signature for diagnostics, like
/// `fn get(&self, index: usize) -> u32`.
fn signature_string(sig: &Signature) -> String {
    let mut s = sig.to_token_stream().to_string();
    for (from, to) in [(" :: ", "::"), (" (", "("), ("( ", "("), (" )", ")"),
                       (" ,", ","), ("& ", "&"), (" :", ":"), (" <", "<"),
                       ("< ", "<"), (" >", ">"), ("' ", "'")]
    {
        s = s.replace(from, to);
    }
    s
}

fn check_supertraits(item: &ItemTrait) -> syn::Result<()> {
    for bound in item.supertraits.iter() {
        let TypeParamBound::Trait(tb) = bound else { continue };
        let ok = tb.path.get_ident()
            .map(|i| i == "Send" || i == "Sync")
            .unwrap_or(false);
        if !ok {
            return Err(Error::new(tb.span(),
                "supertraits other than Send and Sync are not supported"));
        }
    }
    Ok(())
}

pub(crate) fn do_stand_in(attrs: TokenStream, input: TokenStream)
    -> syn::Result<TokenStream>
{
    let attrs: Attrs = syn::parse2(attrs)?;
    let mut item: ItemTrait = syn::parse2(input)?;
    if !item.generics.params.is_empty() {
        return Err(Error::new(item.generics.span(),
            "generic traits are not supported"));
    }
    check_supertraits(&item)?;
    let mut methods = Vec::new();
    for trait_item in item.items.iter_mut() {
        match trait_item {
            TraitItem::Fn(f) => {
                let method = classify(methods.len(), f.clone(), attrs.class)?;
                f.attrs = method.item.attrs.clone();
                methods.push(method);
            }
            TraitItem::Type(t) => return Err(Error::new(t.span(),
                "associated types are not supported")),
            TraitItem::Const(c) => return Err(Error::new(c.span(),
                "associated constants are not supported")),
            other => return Err(Error::new(other.span(),
                "unsupported trait item")),
        }
    }
    let mock = gen_mock(&item, &attrs, &methods);
    Ok(quote!(#item #mock))
}

fn gen_mock(item: &ItemTrait, attrs: &Attrs, methods: &[Method])
    -> TokenStream
{
    let vis = &item.vis;
    let trait_ident = &item.ident;
    let mock_ident = format_ident!("Mock{}", trait_ident);
    let type_name = trait_ident.to_string();
    let mock_name = mock_ident.to_string();
    let type_kind = attrs.type_kind();
    let n = methods.len();
    let descriptors = methods.iter().map(Method::descriptor);
    let impls = methods.iter().map(Method::gen_impl);
    let unsafety = &item.unsafety;
    let doc = format!("Stand-in for [`{type_name}`]");
    quote!(
        #[doc = #doc]
        #vis struct #mock_ident {
            interceptor: ::replaymock::Interceptor,
        }

        impl ::replaymock::Mock for #mock_ident {
            fn interceptor(&self) -> &::replaymock::Interceptor {
                &self.interceptor
            }
        }

        impl ::replaymock::StandIn for #mock_ident {
            fn type_description() -> &'static ::replaymock::TypeDescription {
                static METHODS: [::replaymock::MethodDescriptor; #n] =
                    [#(#descriptors),*];
                static DESCRIPTION: ::replaymock::TypeDescription =
                    ::replaymock::TypeDescription::new(#type_name,
                        ::replaymock::TypeKind::#type_kind, &METHODS);
                &DESCRIPTION
            }

            fn from_interceptor(interceptor: ::replaymock::Interceptor)
                -> Self
            {
                #mock_ident { interceptor }
            }
        }

        impl ::std::fmt::Debug for #mock_ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>)
                -> ::std::fmt::Result
            {
                f.debug_struct(#mock_name)
                    .field("interceptor", &self.interceptor)
                    .finish()
            }
        }

        #unsafety impl #trait_ident for #mock_ident {
            #(#impls)*
        }
    )
}
