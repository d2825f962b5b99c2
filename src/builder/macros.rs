//! Macros for declaring typed model actions.

/// Declare model action types with their wire format.
///
/// Each declared struct gets public fields, an [`ActionType`] implementation
/// whose signature lists the field kinds in declaration order, and
/// conversions into [`ModelAction`] and [`Action`]. Field types must
/// implement [`Primitive`] (`bool`, `i32`, `String`).
///
/// [`ActionType`]: crate::core::ActionType
/// [`ModelAction`]: crate::core::ModelAction
/// [`Action`]: crate::core::Action
/// [`Primitive`]: crate::core::Primitive
///
/// # Example
///
/// ```
/// use refinery::core::{ActionType, Catalog};
/// use refinery::model_actions;
///
/// model_actions! {
///     pub struct ConnectItem {
///         id1: i32,
///         id2: i32,
///     }
///
///     pub struct DeleteBegin {}
/// }
///
/// let connect = ConnectItem { id1: 1, id2: 2 };
/// assert_eq!(connect.serialize(), "ConnectItem(1,2)");
/// assert_eq!(DeleteBegin {}.serialize(), "DeleteBegin");
///
/// let mut catalog = Catalog::new();
/// catalog.register_type::<ConnectItem>().register_type::<DeleteBegin>();
/// let parsed = catalog.deserialize("ConnectItem(1,2)").unwrap();
/// assert_eq!(ConnectItem::from_model_action(&parsed).unwrap(), connect);
/// ```
#[macro_export]
macro_rules! model_actions {
    (
        $(
            $(#[$meta:meta])*
            $vis:vis struct $name:ident {
                $(
                    $(#[$field_meta:meta])*
                    $field:ident : $ty:ty
                ),* $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
            $vis struct $name {
                $(
                    $(#[$field_meta])*
                    pub $field: $ty
                ),*
            }

            impl $crate::core::ActionType for $name {
                const NAME: &'static str = stringify!($name);

                fn signature() -> $crate::core::Signature {
                    $crate::core::Signature::new(
                        stringify!($name),
                        vec![$(<$ty as $crate::core::Primitive>::KIND),*],
                    )
                }

                fn to_model_action(&self) -> $crate::core::ModelAction {
                    $crate::core::ModelAction::new(
                        stringify!($name),
                        vec![$(
                            $crate::core::Primitive::into_value(
                                ::std::clone::Clone::clone(&self.$field),
                            )
                        ),*],
                    )
                }

                #[allow(unused_mut, unused_variables)]
                fn from_model_action(
                    action: &$crate::core::ModelAction,
                ) -> ::std::result::Result<Self, $crate::core::ActionError> {
                    <Self as $crate::core::ActionType>::signature().check(action)?;
                    let mut fields = action.fields().iter();
                    ::std::result::Result::Ok(Self {
                        $(
                            $field: fields
                                .next()
                                .and_then(<$ty as $crate::core::Primitive>::from_value)
                                .ok_or_else(|| $crate::core::ActionError::Malformed {
                                    text: action.serialize(),
                                    reason: ::std::format!(
                                        "field '{}' is missing",
                                        stringify!($field)
                                    ),
                                })?,
                        )*
                    })
                }
            }

            impl ::std::convert::From<$name> for $crate::core::ModelAction {
                fn from(action: $name) -> Self {
                    $crate::core::ActionType::to_model_action(&action)
                }
            }

            impl<S> ::std::convert::From<$name> for $crate::core::Action<S> {
                fn from(action: $name) -> Self {
                    $crate::core::Action::Model(
                        $crate::core::ActionType::to_model_action(&action),
                    )
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(&$crate::core::ActionType::serialize(self))
                }
            }
        )*
    };
}
