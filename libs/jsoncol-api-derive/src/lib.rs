use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for entity schema description and row mapping.
///
/// Generates `impl jsoncol_api::entity::Entity` on the annotated struct:
///
/// - `entity_type()` — one `PropertyDescriptor` per field, in declaration order.
/// - `to_row()` / `from_row()` — column values through `EntityMap`.
///
/// Fields marked `#[json]` are described with `PropertyDescriptor::json::<T>`
/// (requires `T: Serialize + DeserializeOwned`) and are stored through the
/// converter registered by the model scan. All other fields must implement
/// `jsoncol_api::value::Column`.
///
/// # Example
///
/// ```ignore
/// #[derive(Entity)]
/// #[entity(table = "orders")]
/// pub struct Order {
///     pub id: i64,
///     #[json]
///     pub metadata: Metadata,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, json))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let name_str = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Entity only supports structs")),
    };

    // Parse #[entity(...)] on the struct.
    let mut table = name_str.clone();
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown entity attribute (expected `table`)"))
            }
        })?;
    }

    let mut property_tokens = Vec::new();
    let mut write_tokens = Vec::new();
    let mut read_tokens = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_name_str = field_name.to_string();
        let field_ty = &field.ty;

        // Parse #[json] marker. Presence only.
        let mut json = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("json") {
                continue;
            }
            attr.meta.require_path_only()?;
            if json {
                return Err(syn::Error::new_spanned(attr, "duplicate #[json] marker"));
            }
            json = true;
        }

        if json {
            property_tokens.push(quote! {
                jsoncol_api::schema::PropertyDescriptor::json::<#field_ty>(#field_name_str)
            });
            write_tokens.push(quote! {
                __map.write_converted::<#field_ty>(#index, &self.#field_name)?
            });
            read_tokens.push(quote! {
                #field_name: __map.read_converted::<#field_ty>(#index, &__row.0[#index])?
            });
        } else {
            property_tokens.push(quote! {
                jsoncol_api::schema::PropertyDescriptor::column::<#field_ty>(#field_name_str)
            });
            write_tokens.push(quote! {
                jsoncol_api::value::Column::to_column(&self.#field_name)
            });
            read_tokens.push(quote! {
                #field_name: __map.read_native::<#field_ty>(#index, &__row.0[#index])?
            });
        }
    }

    let expanded = quote! {
        impl jsoncol_api::entity::Entity for #name {
            fn entity_type() -> jsoncol_api::schema::EntityType {
                jsoncol_api::schema::EntityType::new::<Self>(#name_str)
                    .with_table(#table)
                    #(.with_property(#property_tokens))*
            }

            fn to_row(
                &self,
                __map: &jsoncol_api::mapping::EntityMap,
            ) -> Result<jsoncol_api::value::Row, jsoncol_api::error::ConvertError> {
                let __row = jsoncol_api::value::Row(vec![
                    #(#write_tokens),*
                ]);
                __map.check_row(&__row)?;
                Ok(__row)
            }

            fn from_row(
                __row: &jsoncol_api::value::Row,
                __map: &jsoncol_api::mapping::EntityMap,
            ) -> Result<Self, jsoncol_api::error::ConvertError> {
                __map.check_row(__row)?;
                Ok(Self {
                    #(#read_tokens),*
                })
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
