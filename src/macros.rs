//! Record type declaration macro.

/// Declare a record type and implement [`Model`](crate::record::Model) for it.
///
/// Each field is written as `name: Type = kind`, where `kind` is one of the
/// [`Field`](crate::models::Field) constructors (`string`, `integer`, `float`,
/// `boolean`, `text`) optionally followed by builder calls. The table name
/// defaults to the type name; `#[table = "..."]` must come first to override it.
///
/// The struct derives `Debug`, `Clone`, `Default` and `PartialEq`. A field
/// whose default should be applied on insert must be an `Option`, since only
/// a null value counts as absent.
///
/// ```ignore
/// model! {
///     #[table = "users"]
///     pub struct User {
///         pub id: Option<String> = string.primary_key().ddl("varchar(50)"),
///         pub email: String = string.ddl("varchar(50)"),
///         pub admin: bool = boolean,
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        @impl $table:expr;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $kind:ident $( . $method:ident ( $($arg:expr),* ) )*
            ),+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )+
        }

        impl $crate::record::Model for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn table_name() -> ::std::option::Option<&'static str> {
                $table
            }

            fn declared_fields() -> ::std::vec::Vec<$crate::models::Field> {
                vec![
                    $(
                        $crate::models::Field::$kind(stringify!($field)) $( .$method($($arg),*) )*
                    ),+
                ]
            }

            fn schema_cell() -> &'static ::std::sync::OnceLock<$crate::models::Schema> {
                static CELL: ::std::sync::OnceLock<$crate::models::Schema> =
                    ::std::sync::OnceLock::new();
                &CELL
            }

            fn get_field(&self, name: &str) -> $crate::error::DbResult<$crate::models::Value> {
                match name {
                    $(
                        stringify!($field) => Ok($crate::models::Value::from(self.$field.clone())),
                    )+
                    _ => Err($crate::error::DbError::unknown_field(stringify!($name), name)),
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::models::Value,
            ) -> $crate::error::DbResult<()> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::models::FromValue>::from_value(value)?;
                            Ok(())
                        }
                    )+
                    _ => Err($crate::error::DbError::unknown_field(stringify!($name), name)),
                }
            }
        }
    };

    (
        #[table = $table:literal]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $kind:ident $( . $method:ident ( $($arg:expr),* ) )*
            ),+ $(,)?
        }
    ) => {
        $crate::model! {
            @impl ::std::option::Option::Some($table);
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$fmeta])*
                    $fvis $field : $ty = $kind $( . $method ( $($arg),* ) )*
                ),+
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $kind:ident $( . $method:ident ( $($arg:expr),* ) )*
            ),+ $(,)?
        }
    ) => {
        $crate::model! {
            @impl ::std::option::Option::None;
            $(#[$meta])*
            $vis struct $name {
                $(
                    $(#[$fmeta])*
                    $fvis $field : $ty = $kind $( . $method ( $($arg),* ) )*
                ),+
            }
        }
    };
}
