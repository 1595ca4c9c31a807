use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

/// Derive macro for per-step flux records.
///
/// Every field of the annotated struct must be `f64`. The derive generates:
///
/// - a companion `{StructName}Timeseries` struct holding one `Vec<f64>` per field,
///   with `with_capacity`, `push`, `len` and `is_empty`;
/// - `field_names()` on the record, listing the fields in declaration order;
/// - `to_array()` on the record, returning the values in the same order.
///
/// `#[fluxes(timeseries_name = "CustomName")]` overrides the companion name.
#[proc_macro_derive(Fluxes, attributes(fluxes))]
pub fn derive_fluxes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let ts_name = match extract_timeseries_name(&input) {
        Ok(Some(ident)) => ident,
        Ok(None) => format_ident!("{}Timeseries", name),
        Err(err) => return err.to_compile_error().into(),
    };

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "Fluxes can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Fluxes can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    if fields.is_empty() {
        return syn::Error::new_spanned(name, "Fluxes struct must have at least one field")
            .to_compile_error()
            .into();
    }

    let mut field_idents = Vec::with_capacity(fields.len());
    for field in fields {
        if !is_f64_type(&field.ty) {
            return syn::Error::new_spanned(&field.ty, "Fluxes derive: all fields must be f64")
                .to_compile_error()
                .into();
        }
        // Named fields always carry an ident.
        if let Some(ident) = field.ident.as_ref() {
            field_idents.push(ident);
        }
    }

    let n_fields = field_idents.len();
    let first_field = field_idents[0];
    let field_name_strs: Vec<String> = field_idents.iter().map(|f| f.to_string()).collect();

    let ts_fields = field_idents.iter().map(|f| quote! { pub #f: Vec<f64> });
    let with_cap_fields = field_idents.iter().map(|f| quote! { #f: Vec::with_capacity(n) });
    let push_fields = field_idents.iter().map(|f| quote! { self.#f.push(f.#f); });
    let array_fields = field_idents.iter().map(|f| quote! { self.#f });

    let expanded = quote! {
        /// Timeseries of per-step records, one vector per field.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct #ts_name {
            #(#ts_fields,)*
        }

        impl #ts_name {
            /// Pre-allocate all vectors for `n` timesteps.
            pub fn with_capacity(n: usize) -> Self {
                Self {
                    #(#with_cap_fields,)*
                }
            }

            /// Append one timestep.
            pub fn push(&mut self, f: &#name) {
                #(#push_fields)*
            }

            /// Number of timesteps stored.
            pub fn len(&self) -> usize {
                self.#first_field.len()
            }

            /// Returns `true` if no timesteps have been stored.
            pub fn is_empty(&self) -> bool {
                self.#first_field.is_empty()
            }
        }

        impl #name {
            /// Field names in declaration order.
            pub fn field_names() -> &'static [&'static str] {
                &[#(#field_name_strs),*]
            }

            /// Field values in declaration order.
            pub fn to_array(&self) -> [f64; #n_fields] {
                [#(#array_fields),*]
            }
        }
    };

    expanded.into()
}

fn extract_timeseries_name(input: &DeriveInput) -> syn::Result<Option<proc_macro2::Ident>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("fluxes") {
            continue;
        }
        let nested = attr.parse_args_with(
            syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated,
        )?;
        for meta in nested {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("timeseries_name") => {
                    if let syn::Expr::Lit(expr_lit) = &nv.value {
                        if let Lit::Str(lit_str) = &expr_lit.lit {
                            return Ok(Some(format_ident!("{}", lit_str.value())));
                        }
                    }
                    return Err(syn::Error::new_spanned(
                        &nv.value,
                        "timeseries_name must be a string literal",
                    ));
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unknown fluxes attribute, expected `timeseries_name = \"...\"`",
                    ));
                }
            }
        }
    }
    Ok(None)
}

fn is_f64_type(ty: &syn::Type) -> bool {
    if let syn::Type::Path(type_path) = ty {
        type_path.path.is_ident("f64")
    } else {
        false
    }
}
