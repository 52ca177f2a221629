use camino::{Utf8Path, Utf8PathBuf};

macro_rules! define_paths {
    ($name:ident { $($field:ident : $default:expr),* $(,)? }) => {
        #[derive(Clone, Debug)]
        pub struct $name {
            $(pub $field: Utf8PathBuf,)*
        }

        impl $name {
            pub fn to_absolute(mut self, base: &Utf8Path) -> Self {
                $(self.$field = base.join(self.$field);)*
                self
            }

            pub fn new(base: &Utf8Path) -> Self {
                Self::default().to_absolute(base)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.into(),)*
                }
            }
        }
    };
}

define_paths!(DataPathRules {
    collections: "collections.json",
    logs: "logs",
});

/// Name of the project file that marks an addon folder on disk.
pub const ADDON_PROJECT_FILE: &str = "addon.gproj";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_paths_are_rooted_at_base() {
        let rules = DataPathRules::new(Utf8Path::new("/srv/dashboard"));
        assert_eq!(rules.collections, Utf8PathBuf::from("/srv/dashboard/collections.json"));
        assert_eq!(rules.logs, Utf8PathBuf::from("/srv/dashboard/logs"));
    }
}
