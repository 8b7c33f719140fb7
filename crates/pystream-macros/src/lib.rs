use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

/// Derive macro that generates a companion `*Timeseries` struct collecting
/// one value per simulated month for every field. All fields must be `f64`.
///
/// The generated struct stores each field as `Vec<f64>` and provides
/// `with_capacity`, `push`, `get`, `len`, `is_empty` and `columns`.
/// The source struct gains a `field_names()` associated function.
///
/// `#[fluxes(timeseries_name = "CustomName")]` overrides the default
/// `{StructName}Timeseries` name.
#[proc_macro_derive(Fluxes, attributes(fluxes))]
pub fn derive_fluxes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let ts_name = match timeseries_name(&input) {
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

    let mut idents = Vec::with_capacity(fields.len());
    for field in fields {
        if !is_f64(&field.ty) {
            return syn::Error::new_spanned(&field.ty, "Fluxes derive: all fields must be f64")
                .to_compile_error()
                .into();
        }
        if let Some(ident) = field.ident.as_ref() {
            idents.push(ident);
        }
    }

    let first = idents[0];
    let n_fields = idents.len();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();

    let expanded = quote! {
        /// Per-month values of every flux, one vector per field.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct #ts_name {
            #(pub #idents: Vec<f64>,)*
        }

        impl #ts_name {
            /// Pre-allocate all vectors for `n` months.
            pub fn with_capacity(n: usize) -> Self {
                Self {
                    #(#idents: Vec::with_capacity(n),)*
                }
            }

            /// Append one month.
            pub fn push(&mut self, f: &#name) {
                #(self.#idents.push(f.#idents);)*
            }

            /// Values of month `t`, if stored.
            pub fn get(&self, t: usize) -> Option<#name> {
                if t >= self.len() {
                    return None;
                }
                Some(#name {
                    #(#idents: self.#idents[t],)*
                })
            }

            pub fn len(&self) -> usize {
                self.#first.len()
            }

            pub fn is_empty(&self) -> bool {
                self.#first.is_empty()
            }

            /// `(name, values)` pairs in declaration order.
            pub fn columns(&self) -> [(&'static str, &[f64]); #n_fields] {
                [#((#names, self.#idents.as_slice()),)*]
            }
        }

        impl #name {
            /// Field names in declaration order.
            pub fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }
        }
    };

    expanded.into()
}

fn timeseries_name(input: &DeriveInput) -> syn::Result<Option<proc_macro2::Ident>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("fluxes") {
            continue;
        }
        let nested = attr.parse_args_with(
            syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated,
        )?;
        for meta in nested {
            let nv = match meta {
                Meta::NameValue(nv) => nv,
                other => {
                    return Err(syn::Error::new_spanned(other, "expected `key = \"value\"`"));
                }
            };
            if !nv.path.is_ident("timeseries_name") {
                return Err(syn::Error::new_spanned(nv.path, "unknown fluxes attribute"));
            }
            if let syn::Expr::Lit(expr_lit) = &nv.value {
                if let Lit::Str(lit) = &expr_lit.lit {
                    return Ok(Some(format_ident!("{}", lit.value())));
                }
            }
            return Err(syn::Error::new_spanned(nv.value, "timeseries_name must be a string"));
        }
    }
    Ok(None)
}

fn is_f64(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(p) if p.qself.is_none() && p.path.is_ident("f64"))
}
