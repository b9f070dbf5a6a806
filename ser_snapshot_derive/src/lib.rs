use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{
	parse_macro_input, parse_quote, spanned::Spanned, Attribute, Data, DeriveInput, Field, Fields,
	GenericParam, Generics, Ident, LitStr, Path,
};

mod structs;
use structs::derive_struct;
mod enums;
use enums::derive_enum;

/// Derive `ToValue`.
///
/// Structs become records tagged with the struct's name. Enum unit variants
/// become strings, other variants records tagged with the variant's name.
///
/// Attributes:
/// * `#[value_type("Name")]` on a struct or enum variant: record type name.
/// * `#[value_rename("key")]` on a field: field name in the record.
/// * `#[value_skip]` on a field: leave it out.
/// * `#[value_with(Proxy)]` on a field: convert via `Proxy: ToValueWith<FieldType>`.
#[proc_macro_derive(ToValue, attributes(value_type, value_rename, value_skip, value_with))]
pub fn to_value(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let type_name = get_type_name(&input.attrs);

	let body = match input.data {
		Data::Struct(data) => {
			let type_name = type_name.unwrap_or_else(|| input.ident.to_string());
			derive_struct(data, &type_name)
		}
		Data::Enum(data) => {
			if type_name.is_some() {
				panic!("`#[value_type]` on an enum must be placed on its variants");
			}
			derive_enum(data)
		}
		Data::Union(_) => todo!("Deriving `ToValue` on Unions not supported"),
	};

	impl_to_value(&input.ident, &input.generics, body).into()
}

/// Wrap conversion `body` (which may refer to `self`) in an `impl ToValue`.
/// Every type param gets a `ToValue` bound.
fn impl_to_value(ident: &Ident, generics: &Generics, body: TokenStream) -> TokenStream {
	let mut bounded = generics.clone();
	for param in &mut bounded.params {
		if let GenericParam::Type(type_param) = param {
			type_param.bounds.push(parse_quote!(::ser_snapshot::ToValue));
		}
	}
	let (impl_generics, _, _) = bounded.split_for_impl();
	let (_, type_generics, where_clause) = generics.split_for_impl();

	quote! {
		#[automatically_derived]
		impl #impl_generics ::ser_snapshot::ToValue for #ident #type_generics #where_clause {
			fn to_value(&self) -> ::ser_snapshot::Value {
				#body
			}
		}
	}
}

/// Parse `#[value_type("Name")]` attribute
pub(crate) fn get_type_name(attrs: &[Attribute]) -> Option<String> {
	let mut type_name: Option<String> = None;
	for attr in attrs.iter().filter(|attr| attr.path.is_ident("value_type")) {
		let name = attr
			.parse_args::<LitStr>()
			.expect("`#[value_type]` needs a string e.g. `#[value_type(\"User\")]`");
		if type_name.replace(name.value()).is_some() {
			panic!("Can only have one `#[value_type]` attribute");
		}
	}
	type_name
}

/// A field which ends up in the record: its key, and an expression producing
/// its `Value`.
pub(crate) struct RecordField {
	key: String,
	value: TokenStream,
	span: Span,
}

/// Collect the record fields of a struct or variant, honouring field
/// attributes.
///
/// `access` gives an expression of type `&FieldType` for the field at a
/// position.
pub(crate) fn record_fields<F>(fields: &Fields, access: F) -> Vec<RecordField>
where F: Fn(usize, &Field) -> TokenStream {
	fields
		.iter()
		.enumerate()
		.filter_map(|(position, field)| {
			let attrs = FieldAttrs::parse(field);
			if attrs.skip {
				return None;
			}

			let key = attrs.rename.unwrap_or_else(|| match &field.ident {
				Some(ident) => ident.to_string(),
				None => position.to_string(),
			});
			let access = access(position, field);
			let value = match attrs.with {
				Some(with) => quote! {
					<#with as ::ser_snapshot::ToValueWith<_>>::to_value_with(#access)
				},
				None => quote! { ::ser_snapshot::ToValue::to_value(#access) },
			};

			Some(RecordField {
				key,
				value,
				span: field.span(),
			})
		})
		.collect()
}

/// Expression building a record tagged `type_name` from `fields`.
pub(crate) fn record_expr(type_name: &str, fields: &[RecordField]) -> TokenStream {
	let inserts = fields.iter().map(|RecordField { key, value, span }| {
		quote_spanned! {*span=>
			__object.insert(#key, #value);
		}
	});

	quote! {{
		#[allow(unused_mut)]
		let mut __object = ::ser_snapshot::Object::new(#type_name);
		#(#inserts)*
		::ser_snapshot::Value::from(__object)
	}}
}

/// Field attributes: `#[value_rename]`, `#[value_skip]`, `#[value_with]`.
#[derive(Default)]
struct FieldAttrs {
	rename: Option<String>,
	skip: bool,
	with: Option<Path>,
}

impl FieldAttrs {
	fn parse(field: &Field) -> Self {
		let mut attrs = FieldAttrs::default();

		for attr in &field.attrs {
			if attr.path.is_ident("value_skip") {
				if !attr.tokens.is_empty() {
					panic!("`#[value_skip]` takes no arguments");
				}
				attrs.skip = true;
			} else if attr.path.is_ident("value_rename") {
				let key = attr
					.parse_args::<LitStr>()
					.expect("`#[value_rename]` needs a string e.g. `#[value_rename(\"key\")]`");
				if attrs.rename.replace(key.value()).is_some() {
					panic!("Cannot have more than 1 `#[value_rename]` attribute on a field");
				}
			} else if attr.path.is_ident("value_with") {
				let with = attr
					.parse_args::<Path>()
					.expect("`#[value_with]` needs a path e.g. `#[value_with(ForeignTypeProxy)]`");
				if attrs.with.replace(with).is_some() {
					panic!("Cannot have more than 1 `#[value_with]` attribute on a field");
				}
			}
		}

		if attrs.skip && (attrs.rename.is_some() || attrs.with.is_some()) {
			panic!("Cannot combine `#[value_skip]` with other field attributes");
		}
		attrs
	}
}
