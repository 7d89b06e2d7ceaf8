//! Expansion of `#[derive(Injectable)]`.

use darling::{FromDeriveInput, FromMeta};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Type};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableOptions {
    #[darling(multiple, rename = "constructor")]
    constructors: Vec<ConstructorAttr>,
    #[darling(multiple, rename = "property")]
    properties: Vec<MemberAttr>,
    #[darling(multiple, rename = "method")]
    methods: Vec<MemberAttr>,
    #[darling(multiple)]
    implements: Vec<Type>,
    #[darling(default)]
    release: bool,
    #[darling(default)]
    no_constructor: bool,
}

#[derive(Debug, FromMeta)]
struct ConstructorAttr {
    path: syn::Path,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    deprecated: bool,
    #[darling(default)]
    inject: bool,
}

#[derive(Debug, FromMeta)]
struct MemberAttr {
    path: syn::Path,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    optional: bool,
}

/// A field carrying `#[inject]`.
struct InjectField {
    ident: syn::Ident,
    ty: Type,
    optional: bool,
}

fn display_name(explicit: Option<&String>, path: &syn::Path) -> String {
    match explicit {
        Some(name) => name.clone(),
        None => path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
    }
}

/// Returns `T` if `ty` is spelled `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(syn::GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn inject_fields(input: &DeriveInput) -> syn::Result<Vec<InjectField>> {
    let Data::Struct(data) = &input.data else {
        return Ok(Vec::new());
    };
    let Fields::Named(named) = &data.fields else {
        return Ok(Vec::new());
    };

    let mut fields = Vec::new();
    for field in &named.named {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
            let mut optional = false;
            if let syn::Meta::List(_) = &attr.meta {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("optional") {
                        optional = true;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported inject option, expected `optional`"))
                    }
                })?;
            }

            let Some(ident) = field.ident.clone() else {
                continue;
            };
            fields.push(InjectField {
                ident,
                ty: field.ty.clone(),
                optional,
            });
        }
    }
    Ok(fields)
}

pub fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let options = InjectableOptions::from_derive_input(input)?;
    let fields = inject_fields(input)?;

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // ── Constructors ──

    let mut constructor_stmts: Vec<TokenStream> = options
        .constructors
        .iter()
        .map(|ctor| {
            let name = display_name(ctor.name.as_ref(), &ctor.path);
            let path = &ctor.path;
            let mut call = quote! { constructors.add(#name, #path) };
            if ctor.deprecated {
                call = quote! { #call.deprecated() };
            }
            if ctor.inject {
                call = quote! { #call.marked_inject() };
            }
            quote! { #call; }
        })
        .collect();

    if constructor_stmts.is_empty() && !options.no_constructor {
        constructor_stmts.push(quote! {
            constructors.add("default", <Self as ::core::default::Default>::default);
        });
    }

    // ── Members ──

    // An `Option<Arc<C>>` field starts as `None` and is injected with an
    // `Arc<C>`, so `#[inject]` on it is still a mandatory dependency.
    let mut member_stmts = Vec::new();
    for field in &fields {
        let field_ident = &field.ident;
        let name = field_ident.to_string();
        let assign = match option_inner(&field.ty) {
            Some(inner) => quote! {
                |this: &mut Self, value: #inner| {
                    this.#field_ident = ::core::option::Option::Some(value);
                }
            },
            None => {
                let field_ty = &field.ty;
                quote! {
                    |this: &mut Self, value: #field_ty| {
                        this.#field_ident = value;
                    }
                }
            }
        };
        let optional = field.optional.then(|| quote! { .optional() });
        member_stmts.push(quote! {
            members.field(#name, #assign) #optional;
        });
    }

    for property in &options.properties {
        let name = display_name(property.name.as_ref(), &property.path);
        let path = &property.path;
        let optional = property.optional.then(|| quote! { .optional() });
        member_stmts.push(quote! {
            members.property(#name, #path) #optional;
        });
    }

    for method in &options.methods {
        let name = display_name(method.name.as_ref(), &method.path);
        let path = &method.path;
        let optional = method.optional.then(|| quote! { .optional() });
        member_stmts.push(quote! {
            members.method(#name, #path) #optional;
        });
    }

    // ── Capabilities ──

    let contracts = &options.implements;
    let capability_stmts = contracts.iter().map(|contract| {
        quote! { capabilities.add::<#contract>(); }
    });
    let implements_impls = contracts.iter().map(|contract| {
        quote! {
            impl #impl_generics ::wirebox::Implements<#contract> for #ident #ty_generics #where_clause {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#contract> {
                    self
                }
            }
        }
    });

    let as_release = options.release.then(|| {
        quote! {
            fn as_release(&self) -> ::core::option::Option<&dyn ::wirebox::Release> {
                ::core::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::wirebox::Component for #ident #ty_generics #where_clause {
            #as_release
        }

        impl #impl_generics ::wirebox::Injectable for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn constructors(constructors: &mut ::wirebox::Constructors<Self>) {
                #(#constructor_stmts)*
            }

            #[allow(unused_variables)]
            fn members(members: &mut ::wirebox::Members<Self>) {
                #(#member_stmts)*
            }

            #[allow(unused_variables)]
            fn capabilities(capabilities: &mut ::wirebox::Capabilities<Self>) {
                #(#capability_stmts)*
            }
        }

        #(#implements_impls)*
    })
}
