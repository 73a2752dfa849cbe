// Item model
// An item is an open JSON object: `id`, `name` and `imageUrl` are set at
// creation, updates may add or overwrite any top-level field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the lookup key
pub const ID_FIELD: &str = "id";
/// Field holding the display name
pub const NAME_FIELD: &str = "name";
/// Field holding the `/uploads/...` path of the item's image
pub const IMAGE_URL_FIELD: &str = "imageUrl";

/// A single stored record
///
/// Serializes as a plain JSON object with keys kept in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// Create a new item with the three creation-time fields
    pub fn new(id: String, name: String, image_url: String) -> Self {
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(id));
        fields.insert(NAME_FIELD.to_string(), Value::String(name));
        fields.insert(IMAGE_URL_FIELD.to_string(), Value::String(image_url));
        Self(fields)
    }

    /// Wrap an existing JSON object
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The item's id, if it is still a string
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The item's name, if it is a string
    pub fn name(&self) -> Option<&str> {
        self.0.get(NAME_FIELD).and_then(Value::as_str)
    }

    /// The item's image URL, if it is a string
    pub fn image_url(&self) -> Option<&str> {
        self.0.get(IMAGE_URL_FIELD).and_then(Value::as_str)
    }

    /// Look up an arbitrary field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// All fields in insertion order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether this item's id is exactly `id`
    pub fn has_id(&self, id: &str) -> bool {
        self.id() == Some(id)
    }

    /// Shallow merge: every key in `updates` overwrites the current value,
    /// keys not mentioned are left untouched.
    pub fn merge(&mut self, updates: Map<String, Value>) {
        for (key, value) in updates {
            self.0.insert(key, value);
        }
    }
}

/// Index of the first item with the given id
pub fn position_of(items: &[Item], id: &str) -> Option<usize> {
    items.iter().position(|item| item.has_id(id))
}

/// First item with the given id
pub fn find_by_id<'a>(items: &'a [Item], id: &str) -> Option<&'a Item> {
    items.iter().find(|item| item.has_id(id))
}

/// Remove every item with the given id, returning how many were removed
pub fn remove_all_by_id(items: &mut Vec<Item>, id: &str) -> usize {
    let before = items.len();
    items.retain(|item| !item.has_id(id));
    before - items.len()
}
