//! `define_port_error!`, the generator behind the transport and storage port
//! errors.
//!
//! Each variant carries named fields and a display template. The macro
//! derives `thiserror::Error` and adds a documented snake_case constructor
//! per variant whose parameters accept anything convertible into the field
//! type, so adapters can write `TransportError::timeout(err.to_string())` or
//! `KeyValueStoreError::write(key, "disk full")`.

macro_rules! define_port_error {
    (@ctor_impl $name:ident $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
            #[must_use]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $name:ident $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $name
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),+ $(,)? } => $message:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant {
                    $(
                        #[doc = concat!("Detail `", stringify!($field), "` reported by the adapter.")]
                        $field : $ty
                    ),+
                },
            )+
        }

        impl $name {
            $(
                define_port_error!(@ctor_impl $name $variant () () $( $field : $ty, )+);
            )+
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor coverage through the crate's own port errors.

    use crate::domain::ports::{KeyValueStoreError, TransportError};

    #[test]
    fn transport_constructors_take_borrowed_messages() {
        let error = TransportError::unreachable("connection refused");
        assert_eq!(
            error,
            TransportError::Unreachable {
                message: "connection refused".to_owned()
            }
        );
        assert_eq!(error.to_string(), "server unreachable: connection refused");
    }

    #[test]
    fn every_transport_variant_has_a_snake_case_constructor() {
        assert_eq!(
            TransportError::timeout("5s elapsed").to_string(),
            "request timed out: 5s elapsed"
        );
        assert_eq!(
            TransportError::aborted("body cut short").to_string(),
            "request aborted: body cut short"
        );
    }

    #[test]
    fn storage_constructors_fill_every_field() {
        let error = KeyValueStoreError::write("userId", String::from("disk full"));
        assert_eq!(error.to_string(), "failed to store 'userId': disk full");
    }
}
