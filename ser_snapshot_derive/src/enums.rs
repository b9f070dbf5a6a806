use proc_macro2::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{DataEnum, Fields, Ident, Variant};

use crate::{get_type_name, record_expr, record_fields};

/// Conversion body for an enum: a `match` with one arm per variant.
pub fn derive_enum(data: DataEnum) -> TokenStream {
	// Enums with no variants can't be instantiated
	if data.variants.is_empty() {
		return quote! { match *self {} };
	}

	let arms = data.variants.iter().map(variant_arm);
	quote! {
		match self {
			#(#arms)*
		}
	}
}

/// Unit variants become a string of the variant's name.
/// Variants with fields become a record tagged with the variant's name.
fn variant_arm(variant: &Variant) -> TokenStream {
	let type_name = get_type_name(&variant.attrs).unwrap_or_else(|| variant.ident.to_string());
	let ident = &variant.ident;

	// Fields are bound to `__field_<n>`, so a field called e.g. `__object` can't
	// shadow anything the arm body uses
	let binding = |position: usize| format_ident!("__field_{}", position);
	let pattern = match &variant.fields {
		Fields::Unit => {
			return quote_spanned! {ident.span()=>
				Self::#ident => ::ser_snapshot::Value::string(#type_name),
			};
		}
		Fields::Unnamed(fields) => {
			let bindings = (0..fields.unnamed.len()).map(binding);
			quote! { Self::#ident(#(#bindings),*) }
		}
		Fields::Named(fields) => {
			let bindings = fields.named.iter().enumerate().map(|(position, field)| {
				let name: &Ident = field.ident.as_ref().expect("Missing field name");
				let alias = binding(position);
				quote! { #name: #alias }
			});
			quote! { Self::#ident { #(#bindings),* } }
		}
	};

	let fields = record_fields(&variant.fields, |position, _| {
		let alias = binding(position);
		quote! { #alias }
	});
	let body = record_expr(&type_name, &fields);

	quote_spanned! {ident.span()=>
		#[allow(unused_variables)]
		#pattern => #body,
	}
}
