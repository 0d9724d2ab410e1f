use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::ConfigError;
use crate::foundation::math::{Vec2, Vec3, Vec4};

/// Parsed key-value document a component is configured from.
///
/// Every read goes through a get-with-default accessor: a missing key or a
/// value of the wrong shape yields the caller's default and is only reported
/// at `debug` level. Vector and colour fields are numeric lists of 2, 3 or 4
/// components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    table: Table,
}

impl ConfigDocument {
    /// An empty document; every accessor returns its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing table
    pub fn from_table(table: Table) -> Self {
        Self { table }
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let table = toml::from_str::<Table>(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { table })
    }

    /// Parse a RON map, e.g. `{"WheelCount": 6}`
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let table = ron::from_str::<Table>(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { table })
    }

    /// Builder pattern: set a value
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.table.insert(key.to_string(), value.into());
    }

    /// Builder pattern: set a 3-component vector
    pub fn with_vec3(self, key: &str, value: Vec3) -> Self {
        self.with(key, vec![f64::from(value.x), f64::from(value.y), f64::from(value.z)])
    }

    /// Builder pattern: nest a child document
    pub fn with_child(self, key: &str, child: ConfigDocument) -> Self {
        self.with(key, Value::Table(child.table))
    }

    /// Builder pattern: set a list of child documents
    pub fn with_list(self, key: &str, children: Vec<ConfigDocument>) -> Self {
        let values: Vec<Value> = children.into_iter().map(|c| Value::Table(c.table)).collect();
        self.with(key, values)
    }

    /// Whether the key is present at all
    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Read a value, or `None` if missing or of the wrong type
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.table.get(key)?;
        match value.clone().try_into::<T>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                log::debug!("Config key '{}' has unexpected shape ({}), using default", key, err);
                None
            }
        }
    }

    /// Read a value with a fallback
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Read a string with a fallback
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.get_or(key, default.to_string())
    }

    /// Read a 2-component list
    pub fn vec2_or(&self, key: &str, default: Vec2) -> Vec2 {
        self.get::<[f32; 2]>(key).map_or(default, Vec2::from)
    }

    /// Read a 3-component list
    pub fn vec3_or(&self, key: &str, default: Vec3) -> Vec3 {
        self.get::<[f32; 3]>(key).map_or(default, Vec3::from)
    }

    /// Read an RGBA colour (4-component list)
    pub fn color_or(&self, key: &str, default: Vec4) -> Vec4 {
        self.get::<[f32; 4]>(key).map_or(default, Vec4::from)
    }

    /// Nested document; empty when missing
    pub fn child(&self, key: &str) -> ConfigDocument {
        match self.table.get(key) {
            Some(Value::Table(table)) => ConfigDocument::from_table(table.clone()),
            Some(_) => {
                log::debug!("Config key '{}' is not a table, using defaults", key);
                ConfigDocument::new()
            }
            None => ConfigDocument::new(),
        }
    }

    /// List of nested documents; non-table entries are skipped
    pub fn list(&self, key: &str) -> Vec<ConfigDocument> {
        match self.table.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Table(table) => Some(ConfigDocument::from_table(table.clone())),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_keys_fall_back() {
        let doc = ConfigDocument::new();

        assert_relative_eq!(doc.get_or("Health", 1000.0_f32), 1000.0);
        assert!(doc.get_or("InputTypeDigital", true));
        assert_eq!(doc.str_or("CollisionGroup", "Default"), "Default");
        assert_relative_eq!(doc.vec3_or("ChassisSize", Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_wrong_shapes_fall_back() {
        let doc = ConfigDocument::from_toml_str(
            r#"
            Health = "lots"
            ChassisSize = [1.0, 2.0]
            InitialColor = [1, 0, 0, 1]
            "#,
        )
        .unwrap();

        assert_relative_eq!(doc.get_or("Health", 5.0_f32), 5.0);
        assert_relative_eq!(doc.vec3_or("ChassisSize", Vec3::zeros()), Vec3::zeros());
        // integers are accepted where floats are expected
        assert_relative_eq!(doc.color_or("InitialColor", Vec4::zeros()), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_nested_documents() {
        let doc = ConfigDocument::from_toml_str(
            r#"
            WheelCount = 4
            [[AxleData]]
            CenterOffset = 1.5
            WheelInset = 0.9
            [[AxleData]]
            CenterOffset = -1.5
            WheelInset = 0.9
            [Tuning]
            MaxSteerAngle = 0.6
            "#,
        )
        .unwrap();

        let axles = doc.list("AxleData");
        assert_eq!(axles.len(), 2);
        assert_relative_eq!(axles[1].get_or("CenterOffset", 0.0_f32), -1.5);
        assert_relative_eq!(doc.child("Tuning").get_or("MaxSteerAngle", 0.0_f32), 0.6);
        assert!(doc.child("Missing").list("Anything").is_empty());
        assert_eq!(doc.get_or("WheelCount", 0_usize), 4);
    }

    #[test]
    fn test_ron_and_builder_documents_agree() {
        let parsed = ConfigDocument::from_ron_str(r#"{"Lifetime": 2.5, "IsSprite": true}"#).unwrap();
        let built = ConfigDocument::new().with("Lifetime", 2.5).with("IsSprite", true);

        assert_relative_eq!(parsed.get_or("Lifetime", 0.0_f32), built.get_or("Lifetime", 1.0_f32));
        assert_eq!(parsed.get_or("IsSprite", false), built.get_or("IsSprite", false));
    }
}
