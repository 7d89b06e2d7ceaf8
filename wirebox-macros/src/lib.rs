//! Procedural macros for Wirebox.
//!
//! This crate provides `#[derive(Injectable)]`, which turns inert
//! `#[inject]` and `#[injectable(...)]` markers into the shape descriptor
//! the container plans construction and injection from.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod injectable;

/// Derives `Component`, `Injectable` and the declared `Implements` impls.
///
/// # Attributes
///
/// ## Struct-level attributes
///
/// - `#[injectable(constructor(path = "Self::new"))]` - a candidate
///   constructor; repeatable. Options: `name = "..."`, `deprecated`
///   (never selected), `inject` (rejected when the type is planned)
/// - `#[injectable(property(path = "Self::set_clock"))]` - a setter to
///   inject; repeatable, accepts `optional` and `name = "..."`
/// - `#[injectable(method(path = "Self::init"))]` - a method to inject;
///   repeatable, accepts `optional` and `name = "..."`
/// - `#[injectable(implements = "dyn Logger")]` - a contract the type can
///   be bound under; repeatable
/// - `#[injectable(release)]` - the type implements `Release`
/// - `#[injectable(no_constructor)]` - the type is only ever instantiated
///   from a template
///
/// Without any `constructor(...)` and without `no_constructor`,
/// `Default::default` is the only constructor.
///
/// ## Field-level attributes
///
/// - `#[inject]` - assign the field after construction
/// - `#[inject(optional)]` - skip the field if its contract cannot be
///   resolved
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use wirebox::Injectable;
///
/// #[derive(Injectable)]
/// #[injectable(constructor(path = "Self::new"), implements = "dyn Greeter")]
/// struct EnglishGreeter {
///     logger: Arc<dyn Logger>,
///     #[inject(optional)]
///     clock: Option<Arc<dyn Clock>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    injectable::expand(&input)
        .unwrap_or_else(|err| err.write_errors())
        .into()
}
