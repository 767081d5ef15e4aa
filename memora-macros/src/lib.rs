use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, Expr, FnArg, GenericArgument, Ident, ItemFn, Lit, MetaNameValue, Pat,
    PathArguments, ReturnType, Signature, Token, Type,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Global,
    Thread,
}

/// Parsed `#[memoize(...)]` attributes
#[derive(Debug)]
struct MemoizeAttributes {
    scope: Scope,
    single_flight: bool,
    name: Option<String>,
}

impl Default for MemoizeAttributes {
    fn default() -> Self {
        Self {
            scope: Scope::Global,
            single_flight: false,
            name: None,
        }
    }
}

fn str_value(nv: &MetaNameValue) -> syn::Result<String> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(s) => Ok(s.value()),
            other => Err(syn::Error::new_spanned(other, "expected a string literal")),
        },
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn bool_value(nv: &MetaNameValue) -> syn::Result<bool> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Bool(b) => Ok(b.value),
            other => Err(syn::Error::new_spanned(other, "expected `true` or `false`")),
        },
        other => Err(syn::Error::new_spanned(other, "expected `true` or `false`")),
    }
}

fn parse_attributes(attr: TokenStream2) -> syn::Result<MemoizeAttributes> {
    let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
    let parsed = parser.parse2(attr)?;

    let mut attrs = MemoizeAttributes::default();
    for nv in parsed {
        if nv.path.is_ident("scope") {
            attrs.scope = match str_value(&nv)?.as_str() {
                "global" => Scope::Global,
                "thread" => Scope::Thread,
                _ => {
                    return Err(syn::Error::new_spanned(
                        &nv.value,
                        "invalid scope: expected \"global\" or \"thread\"",
                    ))
                }
            };
        } else if nv.path.is_ident("single_flight") {
            attrs.single_flight = bool_value(&nv)?;
        } else if nv.path.is_ident("name") {
            attrs.name = Some(str_value(&nv)?);
        } else {
            return Err(syn::Error::new_spanned(
                &nv.path,
                "unknown attribute: expected `scope`, `single_flight` or `name`",
            ));
        }
    }

    if attrs.single_flight && attrs.scope == Scope::Thread {
        return Err(syn::Error::new(
            Span::call_site(),
            "`single_flight` only applies to `scope = \"global\"`",
        ));
    }
    Ok(attrs)
}

/// One memoized argument: `ident: ty`
struct Argument {
    ident: Ident,
    ty: Type,
}

fn check_signature(sig: &Signature) -> syn::Result<()> {
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[memoize] does not support async functions",
        ));
    }
    if let Some(constness) = &sig.constness {
        return Err(syn::Error::new_spanned(
            constness,
            "#[memoize] does not support const functions",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[memoize] does not support generic functions: the cache is a static of one concrete type",
        ));
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        if let Type::ImplTrait(_) = &**ty {
            return Err(syn::Error::new_spanned(
                ty,
                "#[memoize] needs a nameable return type to declare the cache",
            ));
        }
    }
    Ok(())
}

fn collect_arguments(sig: &Signature) -> syn::Result<Vec<Argument>> {
    let mut arguments = Vec::new();
    for input in &sig.inputs {
        let pat_type = match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[memoize] does not support methods; memoize a free function instead",
                ))
            }
            FnArg::Typed(pat_type) => pat_type,
        };

        let ident = match &*pat_type.pat {
            Pat::Ident(pat_ident) if pat_ident.by_ref.is_none() && pat_ident.subpat.is_none() => {
                pat_ident.ident.clone()
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "#[memoize] arguments must be plain identifiers",
                ))
            }
        };

        match &*pat_type.ty {
            Type::Reference(_) | Type::ImplTrait(_) => {
                return Err(syn::Error::new_spanned(
                    &pat_type.ty,
                    "#[memoize] arguments must be owned `Clone + Eq + Hash + 'static` values",
                ))
            }
            _ => {}
        }

        arguments.push(Argument {
            ident,
            ty: (*pat_type.ty).clone(),
        });
    }
    Ok(arguments)
}

/// Outer signature with `mut` removed from argument bindings; the arguments
/// are only moved into the key there.
fn outer_signature(sig: &Signature) -> Signature {
    let mut sig = sig.clone();
    for input in sig.inputs.iter_mut() {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(pat_ident) = &mut *pat_type.pat {
                pat_ident.mutability = None;
            }
        }
    }
    sig
}

/// The `T` of a `Result<T, ..>` return type, matched on the last path
/// segment so `std::result::Result<T, E>` and `io::Result<T>` also qualify.
fn ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// A `Result` alias without generic arguments, like `fmt::Result`. Its
/// success type is named through `__private::Fallible`.
fn is_bare_result(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .map_or(false, |segment| {
            segment.ident == "Result" && matches!(segment.arguments, PathArguments::None)
        })
}

/// Key type, key expression and the statement rebinding the arguments from a
/// borrowed key inside the compute closure.
fn key_parts(
    sig: &Signature,
    arguments: &[Argument],
) -> (TokenStream2, TokenStream2, TokenStream2, TokenStream2) {
    let pats: Vec<&Pat> = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(pat_type) => Some(&*pat_type.pat),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let idents: Vec<&Ident> = arguments.iter().map(|arg| &arg.ident).collect();
    let tys: Vec<&Type> = arguments.iter().map(|arg| &arg.ty).collect();

    match arguments.len() {
        0 => (quote! { () }, quote! { () }, quote! { _ }, quote! {}),
        1 => {
            let (ident, ty, pat) = (idents[0], tys[0], pats[0]);
            (
                quote! { #ty },
                quote! { #ident },
                quote! { __memora_key },
                quote! { let #pat = ::core::clone::Clone::clone(__memora_key); },
            )
        }
        _ => (
            quote! { (#(#tys),*) },
            quote! { (#(#idents),*) },
            quote! { __memora_key },
            quote! { let (#(#pats),*) = ::core::clone::Clone::clone(__memora_key); },
        ),
    }
}

fn expand(attrs: MemoizeAttributes, input: ItemFn) -> syn::Result<TokenStream2> {
    check_signature(&input.sig)?;
    let arguments = collect_arguments(&input.sig)?;

    let fn_attrs = &input.attrs;
    let vis = &input.vis;
    let sig = outer_signature(&input.sig);
    let block = &input.block;

    let ret_ty = match &input.sig.output {
        ReturnType::Type(_, ty) => (**ty).clone(),
        ReturnType::Default => syn::parse_quote! { () },
    };
    let (value_ty, method) = match ok_type(&ret_ty) {
        Some(ok) => (quote! { #ok }, quote! { try_get_or_add }),
        None if is_bare_result(&ret_ty) => (
            quote! { <#ret_ty as ::memora::__private::Fallible>::Value },
            quote! { try_get_or_add },
        ),
        None => (quote! { #ret_ty }, quote! { get_or_add }),
    };

    let (key_ty, key_expr, key_pat, rebind) = key_parts(&input.sig, &arguments);
    let compute = quote! {
        |#key_pat: &#key_ty| -> #ret_ty {
            #rebind
            #block
        }
    };

    let body = match attrs.scope {
        Scope::Global => {
            let cache_ty = if attrs.single_flight {
                quote! { ::memora::SingleFlightCache<#key_ty, #value_ty> }
            } else {
                quote! { ::memora::LimitlessCache<#key_ty, #value_ty> }
            };
            let name = attrs
                .name
                .unwrap_or_else(|| input.sig.ident.to_string());

            quote! {
                static __MEMORA_CACHE: ::memora::__private::Lazy<#cache_ty> =
                    ::memora::__private::Lazy::new(<#cache_ty>::new);
                static __MEMORA_REGISTER: ::std::sync::Once = ::std::sync::Once::new();

                __MEMORA_REGISTER.call_once(|| {
                    ::memora::__private::register::<#key_ty, #value_ty, _>(#name, &*__MEMORA_CACHE);
                });

                ::memora::Cache::<#key_ty, #value_ty>::#method(&*__MEMORA_CACHE, #key_expr, #compute)
            }
        }
        Scope::Thread => quote! {
            ::std::thread_local! {
                static __MEMORA_CACHE: ::memora::LocalCache<#key_ty, #value_ty> =
                    ::memora::LocalCache::new();
            }

            __MEMORA_CACHE.with(|__memora_cache| {
                ::memora::Cache::<#key_ty, #value_ty>::#method(__memora_cache, #key_expr, #compute)
            })
        },
    };

    Ok(quote! {
        #(#fn_attrs)*
        #vis #sig {
            #body
        }
    })
}

/// Memoizes a free function behind a static cache.
///
/// Every call builds a key from the arguments (the argument itself for one
/// argument, an ordered tuple for several, `()` for none) and returns the
/// stored result for that key, running the body only on a miss.
///
/// # Requirements
///
/// - Free, non-generic, non-async function
/// - Arguments are plain identifiers with owned `Clone + Eq + Hash + 'static`
///   types (no references)
/// - The return type is `Clone + 'static`
/// - The body should be pure: same inputs, same output
///
/// # Attributes
///
/// - `scope` (optional): `"global"` (default) shares one cache between all
///   threads; `"thread"` gives every thread its own `LocalCache`.
/// - `single_flight` (optional, global only): `true` runs the body at most
///   once per key even under concurrent calls, using `SingleFlightCache`.
///   Default `false` uses `LimitlessCache`, where racing callers may each run
///   the body but all return the first stored value.
/// - `name` (optional, global only): the name under which the cache's
///   statistics are registered. Default: the function name.
///
/// # Cache Behavior
///
/// - Functions returning `Result<T, E>` cache only `Ok(T)`; errors are
///   returned and the next call runs the body again. This covers any path
///   ending in `Result`, with or without arguments (`io::Result<T>`,
///   `fmt::Result`). An alias under another name (`type Res = Result<..>`)
///   is not recognised and its `Err` values are cached like any other
///   value.
/// - A panic in the body stores nothing.
/// - Recursive functions work: the body runs without holding any lock.
///
/// # Examples
///
/// ```ignore
/// use memora::memoize;
///
/// #[memoize]
/// fn fibonacci(n: u64) -> u64 {
///     if n < 2 {
///         return n;
///     }
///     fibonacci(n - 1) + fibonacci(n - 2)
/// }
///
/// #[memoize(scope = "thread")]
/// fn distance(a: (i64, i64), b: (i64, i64)) -> u64 {
///     a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
/// }
///
/// #[memoize(single_flight = true, name = "config_loader")]
/// fn load(path: String) -> Result<String, String> {
///     std::fs::read_to_string(&path).map_err(|e| e.to_string())
/// }
/// ```
#[proc_macro_attribute]
pub fn memoize(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match parse_attributes(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };
    let input = parse_macro_input!(item as ItemFn);

    expand(attrs, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
