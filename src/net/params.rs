use std::str::FromStr;

use fxhash::FxHashMap;

use super::ConfigError;

///
/// The parameters assigned to a single component.
///
/// Parameters are stored as strings and only parsed once a
/// component asks for them with a concrete type.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    owner: String,
    map: FxHashMap<String, String>,
}

impl Params {
    /// Creates an empty parameter set for the named component.
    pub fn new(owner: impl Into<String>) -> Params {
        Params {
            owner: owner.into(),
            map: FxHashMap::default(),
        }
    }

    /// Creates new entries from raw input text.
    ///
    /// Each line of the form `key = value` becomes one entry, all other
    /// lines are ignored.
    pub fn parse(&mut self, raw_text: &str) {
        for line in raw_text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                self.insert(key.trim(), value.trim());
            }
        }
    }

    /// Sets a parameter, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.map.insert(key.into(), value.to_string())
    }

    /// Returns the raw value of a parameter, trimming quotation marks.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = self.map.get(key)?.as_str();
        let is_marked = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
        if is_marked {
            Some(&value[1..value.len() - 1])
        } else {
            Some(value)
        }
    }

    /// Whether a parameter was set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// All parameter keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Looks up a parameter and parses it, falling back to `default`
    /// if the parameter is not set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParam`] if the parameter is set but
    /// cannot be parsed into `T`.
    pub fn find<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidParam {
                component: self.owner.clone(),
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lines() {
        let mut params = Params::new("ping");
        params.parse("model = 12\n# comment\nname=\"alice\"\n");
        assert_eq!(params.get("model"), Some("12"));
        assert_eq!(params.get("name"), Some("alice"));
        assert!(!params.contains("comment"));
    }

    #[test]
    fn typed_lookup() {
        let mut params = Params::new("ping");
        assert_eq!(params.find::<u64>("model", 10), Ok(10));

        params.insert("model", 3);
        assert_eq!(params.find::<u64>("model", 10), Ok(3));

        params.insert("model", "-1");
        assert_eq!(
            params.find::<u64>("model", 10),
            Err(ConfigError::InvalidParam {
                component: "ping".to_string(),
                key: "model".to_string(),
                value: "-1".to_string()
            })
        );
    }
}
