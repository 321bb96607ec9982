/// Declares a validated string identifier. `$legacy` matches its legacy indy form; any URI is
/// accepted as well.
#[macro_export]
macro_rules! anoncreds_identifier {
    ($(#[$meta:meta])* $name:ident, $legacy:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, $crate::error::ValidationError> {
                let id = Self(id.into());
                $crate::utils::validation::Validatable::validate(&id)?;
                Ok(id)
            }

            /// Wraps `id` as is. Meant for identifiers read back from trusted storage.
            pub fn new_unchecked(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn is_legacy(&self) -> bool {
                $legacy.is_match(&self.0)
            }

            pub fn is_uri(&self) -> bool {
                $crate::utils::validation::is_uri_identifier(&self.0)
            }
        }

        impl $crate::utils::validation::Validatable for $name {
            fn validate(&self) -> Result<(), $crate::error::ValidationError> {
                if self.is_uri() || self.is_legacy() {
                    return Ok(());
                }
                Err($crate::invalid!(
                    "{} {:?} is neither a URI nor a legacy identifier",
                    stringify!($name),
                    self.0
                ))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}
