//! Service trait macro for the Kit framework
//!
//! Provides the `#[service]` attribute macro that:
//! 1. Adds `Send + Sync + 'static` bounds to trait definitions
//! 2. Optionally declares a default implementation, so `dyn Trait` resolves
//!    without an explicit binding
//! 3. Optionally generates a `fake()` method for testing

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Ident, ItemTrait, Path, Token};

/// Parsed arguments from the service attribute
struct ServiceArgs {
    impl_type: Option<Path>,
    fake_type: Option<Path>,
}

impl Parse for ServiceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ServiceArgs {
            impl_type: None,
            fake_type: None,
        };
        if input.is_empty() {
            return Ok(args);
        }

        // `#[service(Impl)]` or `#[service(impl = Impl, fake = Fake)]`
        let fork = input.fork();
        let is_named = fork.call(Ident::parse_any).is_ok() && fork.peek(Token![=]);
        if !is_named {
            args.impl_type = Some(input.parse()?);
            return Ok(args);
        }

        while !input.is_empty() {
            let name = input.call(Ident::parse_any)?;
            input.parse::<Token![=]>()?;
            let path: Path = input.parse()?;

            match name.to_string().as_str() {
                "impl" => args.impl_type = Some(path),
                "fake" => args.fake_type = Some(path),
                _ => {
                    return Err(syn::Error::new(
                        name.span(),
                        format!("unknown parameter '{}', expected 'impl' or 'fake'", name),
                    ))
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

fn has_trait_bound(item_trait: &ItemTrait, name: &str) -> bool {
    item_trait.supertraits.iter().any(|bound| match bound {
        syn::TypeParamBound::Trait(trait_bound) => trait_bound
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == name),
        _ => false,
    })
}

/// Implements the `#[service]` attribute macro
///
/// # Without arguments (just adds bounds)
///
/// ```rust,ignore
/// #[service]
/// pub trait HttpClient {
///     fn get(&self, url: &str) -> Result<String, Error>;
/// }
/// ```
///
/// # With impl type
///
/// The implementation must itself be `#[injectable]`. Resolving `dyn Trait`
/// with no binding then builds it.
///
/// ```rust,ignore
/// #[service(RedisCache)]  // or #[service(impl = RedisCache)]
/// pub trait CacheStore {
///     fn get(&self, key: &str) -> Option<String>;
/// }
/// ```
///
/// # With fake type (generates fake() for testing)
///
/// ```rust,ignore
/// #[service(impl = RealCache, fake = FakeCache)]
/// pub trait CacheStore {
///     fn get(&self, key: &str) -> Option<String>;
/// }
///
/// // In tests:
/// let _guard = <dyn CacheStore>::fake(&container);
/// ```
pub fn service_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ServiceArgs);
    let mut item_trait = parse_macro_input!(input as ItemTrait);

    if !has_trait_bound(&item_trait, "Send") {
        item_trait.supertraits.push(syn::parse_quote!(Send));
    }
    if !has_trait_bound(&item_trait, "Sync") {
        item_trait.supertraits.push(syn::parse_quote!(Sync));
    }
    let has_static = item_trait
        .supertraits
        .iter()
        .any(|bound| matches!(bound, syn::TypeParamBound::Lifetime(lt) if lt.ident == "static"));
    if !has_static {
        item_trait.supertraits.push(syn::parse_quote!('static));
    }

    let trait_name = &item_trait.ident;
    let trait_name_str = trait_name.to_string();

    let impl_registration = args.impl_type.as_ref().map(|concrete_type| {
        quote! {
            ::kit::inventory::submit! {
                ::kit::container::ClassEntry {
                    class: || {
                        ::kit::container::Class::of::<dyn #trait_name>()
                            .param(::kit::container::Param::dependency::<#concrete_type>("concrete"))
                            .builder_instance(|args: &::kit::container::Arguments| {
                                let concrete: ::std::sync::Arc<dyn #trait_name> =
                                    args.dependency::<#concrete_type>("concrete")?;
                                ::std::result::Result::Ok(::kit::container::Instance::new(concrete))
                            })
                    },
                    name: #trait_name_str,
                }
            }
        }
    });

    let fake_impl = args.fake_type.as_ref().map(|fake_type| {
        quote! {
            impl dyn #trait_name {
                /// Serve the fake implementation from `container` until the
                /// returned guard drops
                pub fn fake(
                    container: &::kit::Container,
                ) -> ::kit::testing::TestContainerGuard<'_> {
                    let fake: ::std::sync::Arc<dyn #trait_name> =
                        ::std::sync::Arc::new(<#fake_type as ::std::default::Default>::default());
                    ::kit::testing::TestContainer::fake_type::<dyn #trait_name>(container, fake)
                }
            }
        }
    });

    let expanded = quote! {
        #item_trait
        #impl_registration
        #fake_impl
    };

    TokenStream::from(expanded)
}
