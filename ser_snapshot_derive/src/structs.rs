use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataStruct, Index};

use crate::{record_expr, record_fields};

/// Conversion body for a struct. Named, tuple and unit structs all become a
/// record; tuple fields are keyed `"0"`, `"1"`...
pub fn derive_struct(data: DataStruct, type_name: &str) -> TokenStream {
	let fields = record_fields(&data.fields, |position, field| match &field.ident {
		Some(ident) => quote! { &self.#ident },
		None => {
			let index = Index::from(position);
			quote! { &self.#index }
		}
	});
	record_expr(type_name, &fields)
}
