/// Given an enum identifier, a struct identifier and a list of
/// `ident, type` pairs, make:
/// - A struct for the given AST node type with the listed public fields
///   plus a process-unique id used to key the resolver's side-table.
/// - An impl with `new`, returning the raw struct, `make`, returning the
///   node wrapped into its enum variant, and the `id` accessor.
#[macro_export]
macro_rules! ast_struct {
    ($enum_name: ident, $struct_name: ident, $($field: ident, $type: ty),*) => {
        #[derive(Debug, gc::Finalize, gc::Trace)]
        pub struct $struct_name {
            $(
                pub $field: $type,
            )*
            id: u128,
        }

        impl $struct_name {
            pub fn new($($field: $type,)*) -> Self {
                Self {
                    $($field,)*
                    id: $crate::unique_id::unique_u128(),
                }
            }

            #[allow(unused)]
            pub fn make($($field: $type,)*) -> $enum_name {
                $enum_name::$struct_name(gc::Gc::new($struct_name::new($($field,)*)))
            }

            #[allow(unused)]
            pub fn id(&self) -> u128 {
                self.id
            }
        }
    };
}

/// The matching sum type: one variant per node struct, each holding its
/// node behind a `Gc` so subtrees are shared rather than cloned.
#[macro_export]
macro_rules! ast_enum {
    ($enum_name: ident, $($item: ident),*) => {
        #[derive(Clone, Debug, gc::Finalize, gc::Trace)]
        pub enum $enum_name {
            $(
                $item(gc::Gc<$item>),
            )*
        }
    };
}
