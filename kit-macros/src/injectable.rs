//! Injectable attribute macro for the Kit framework
//!
//! Generates an `Injectable` impl (the constructor declaration the container
//! uses for auto-wiring) and submits it to the class catalog, so the type can
//! be resolved without registering it first.
//!
//! Constructor parameters are declared with the `#[inject]` field attribute.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Expr, Fields, GenericArgument, LitStr, PathArguments, Type};

/// How an `#[inject]` field gets its default
enum DefaultValue {
    Trait,
    Expr(Expr),
}

/// Parsed `#[inject(...)]` options
struct InjectOptions {
    key: Option<LitStr>,
    default: Option<DefaultValue>,
}

/// Parse the field's `#[inject]` attribute, if any
fn inject_options(field: &syn::Field) -> syn::Result<Option<InjectOptions>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(None);
    };

    let mut options = InjectOptions {
        key: None,
        default: None,
    };
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(Some(options));
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("key") {
            options.key = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("default") {
            options.default = if meta.input.peek(syn::Token![=]) {
                Some(DefaultValue::Expr(meta.value()?.parse()?))
            } else {
                Some(DefaultValue::Trait)
            };
            Ok(())
        } else {
            Err(meta.error("expected `key = \"...\"` or `default`"))
        }
    })?;
    Ok(Some(options))
}

/// The `T` of an `Arc<T>` field type
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Implements the `#[injectable]` attribute macro
///
/// - `Arc<T>` fields marked `#[inject]` are dependencies on `T`'s key
///   (`#[inject(key = "mailer")]` picks another key)
/// - any other `#[inject]` field is a value parameter, supplied by a
///   resolution override or a contextual `$name` binding (its type must be
///   `Clone`)
/// - `#[inject(default)]` / `#[inject(default = expr)]` declare the fallback
/// - fields without `#[inject]` are filled with `Default::default()`
///
/// `#[injectable(middleware)]` also records that the type implements
/// `Middleware`, so the middleware resolver can use it by key.
///
/// # Example
///
/// ```rust,ignore
/// use kit::injectable;
///
/// #[injectable]
/// pub struct ReportService {
///     #[inject]
///     logger: Arc<dyn Logger>,
///     #[inject(default = 25)]
///     page_size: usize,
/// }
///
/// let reports = container.make_type::<ReportService>()?;
/// ```
pub fn injectable_impl(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut middleware = false;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("middleware") {
            middleware = true;
            Ok(())
        } else {
            Err(meta.error("expected `middleware`"))
        }
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input, middleware) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput, middleware: bool) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let vis = &input.vis;
    let attrs = &input.attrs;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "injectable does not support generic types",
        ));
    }

    let syn::Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "injectable can only be used on structs",
        ));
    };

    let (definition, params, construct) = match &data_struct.fields {
        Fields::Unit => (quote! { #vis struct #name; }, Vec::new(), quote! { Self }),
        Fields::Named(fields_named) => {
            let mut field_definitions = Vec::new();
            let mut params = Vec::new();
            let mut field_initializations = Vec::new();

            for field in &fields_named.named {
                let Some(field_name) = field.ident.as_ref() else {
                    continue;
                };
                let field_name_str = field_name.to_string();
                let field_ty = &field.ty;
                let field_vis = &field.vis;

                // Strip #[inject] from the emitted field
                let other_attrs: Vec<_> = field
                    .attrs
                    .iter()
                    .filter(|attr| !attr.path().is_ident("inject"))
                    .collect();
                field_definitions.push(quote! {
                    #(#other_attrs)*
                    #field_vis #field_name: #field_ty
                });

                let Some(options) = inject_options(field)? else {
                    field_initializations.push(quote! {
                        #field_name: ::std::default::Default::default()
                    });
                    continue;
                };

                let (param, init) = match arc_inner(field_ty) {
                    Some(inner) => dependency_param(&field_name_str, inner, field_ty, &options),
                    None => value_param(&field_name_str, field_ty, &options),
                };
                params.push(param);
                field_initializations.push(quote! { #field_name: #init });
            }

            (
                quote! {
                    #vis struct #name {
                        #(#field_definitions),*
                    }
                },
                params,
                quote! {
                    Self {
                        #(#field_initializations),*
                    }
                },
            )
        }
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "injectable does not support tuple structs. Use named fields instead.",
            ))
        }
    };

    let middleware_caster = middleware.then(|| {
        quote! {
            .middleware(|instance: &::kit::container::Instance| {
                instance
                    .downcast::<Self>()
                    .map(|m| m as ::std::sync::Arc<dyn ::kit::middleware::Middleware>)
            })
        }
    });

    Ok(quote! {
        #(#attrs)*
        #definition

        impl ::kit::container::Injectable for #name {
            fn class() -> ::kit::container::Class {
                ::kit::container::Class::of::<Self>()
                    #(.param(#params))*
                    .builder(|args: &::kit::container::Arguments| {
                        let _ = args;
                        ::std::result::Result::Ok(#construct)
                    })
                    #middleware_caster
            }
        }

        ::kit::inventory::submit! {
            ::kit::container::ClassEntry {
                class: <#name as ::kit::container::Injectable>::class,
                name: #name_str,
            }
        }
    })
}

fn dependency_param(
    field: &str,
    inner: &Type,
    field_ty: &Type,
    options: &InjectOptions,
) -> (TokenStream2, TokenStream2) {
    let mut param = match &options.key {
        Some(key) => quote! { ::kit::container::Param::dependency_on(#field, #key) },
        None => quote! { ::kit::container::Param::dependency::<#inner>(#field) },
    };
    if let Some(default) = &options.default {
        let value = match default {
            DefaultValue::Trait => quote! { <#field_ty as ::std::default::Default>::default() },
            DefaultValue::Expr(expr) => quote! { #expr },
        };
        param = quote! {
            #param.with_default_instance(|| {
                let value: #field_ty = #value;
                ::kit::container::Instance::new::<#inner>(value)
            })
        };
    }
    let init = quote! { args.dependency::<#inner>(#field)? };
    (param, init)
}

fn value_param(
    field: &str,
    field_ty: &Type,
    options: &InjectOptions,
) -> (TokenStream2, TokenStream2) {
    let mut param = quote! { ::kit::container::Param::value(#field) };
    if let Some(default) = &options.default {
        let value = match default {
            DefaultValue::Trait => quote! { <#field_ty as ::std::default::Default>::default() },
            DefaultValue::Expr(expr) => quote! { #expr },
        };
        param = quote! {
            #param.with_default(|| -> #field_ty { #value })
        };
    }
    let init = quote! { args.value::<#field_ty>(#field)? };
    (param, init)
}
