use serde_json::{json, Map, Value as JsonValue};

use crate::encoder::encode;
use crate::value::Value;

/// Reverse-geocoded postal address.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub admin_area: Option<String>,
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub feature_name: Option<String>,
    pub phone: Option<String>,
    pub locality: Option<String>,
    pub postal_code: Option<String>,
    pub sub_admin_area: Option<String>,
    pub thoroughfare: Option<String>,
    pub url: Option<String>,
}

impl Address {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "admin_area": self.admin_area,
            "country_code": self.country_code,
            "country_name": self.country_name,
            "feature_name": self.feature_name,
            "phone": self.phone,
            "locality": self.locality,
            "postal_code": self.postal_code,
            "sub_admin_area": self.sub_admin_area,
            "thoroughfare": self.thoroughfare,
            "url": self.url,
        })
    }
}

/// A location fix.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// UTC time of the fix, in milliseconds since the epoch.
    pub time: i64,
    pub accuracy: f32,
    pub speed: f32,
    pub provider: Option<String>,
    pub bearing: f32,
}

impl Location {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "altitude": encode(&Value::Double(self.altitude)),
            "latitude": encode(&Value::Double(self.latitude)),
            "longitude": encode(&Value::Double(self.longitude)),
            "time": self.time,
            "accuracy": encode(&Value::Float(self.accuracy)),
            "speed": encode(&Value::Float(self.speed)),
            "provider": self.provider,
            "bearing": encode(&Value::Float(self.bearing)),
        })
    }
}

/// An intent as seen by scripts: action, data, extras and target component.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    pub action: Option<String>,
    pub data: Option<String>,
    pub mime_type: Option<String>,
    /// Extras bundle, usually a `Value::Map`.
    pub extras: Option<Value>,
    pub categories: Option<Vec<String>>,
    /// `(package name, class name)` of the explicit target.
    pub component: Option<(String, String)>,
    pub flags: i32,
}

impl Intent {
    pub(crate) fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        out.insert("data".to_string(), json!(self.data));
        out.insert("type".to_string(), json!(self.mime_type));
        out.insert(
            "extras".to_string(),
            self.extras.as_ref().map_or(JsonValue::Null, encode),
        );
        out.insert(
            "categories".to_string(),
            self.categories
                .as_ref()
                .map_or(JsonValue::Null, |c| encode(&Value::set(c.iter().map(String::as_str)))),
        );
        out.insert("action".to_string(), json!(self.action));
        if let Some((package, class)) = &self.component {
            out.insert("packagename".to_string(), json!(package));
            out.insert("classname".to_string(), json!(class));
        }
        out.insert("flags".to_string(), json!(self.flags));
        JsonValue::Object(out)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({ "x": self.x, "y": self.y })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width_pixels: i32,
    pub height_pixels: i32,
    pub noncompat_width_pixels: i32,
    pub noncompat_height_pixels: i32,
}

impl DisplayMetrics {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "widthPixels": self.width_pixels,
            "heightPixels": self.height_pixels,
            "noncompatHeightPixels": self.noncompat_height_pixels,
            "noncompatWidthPixels": self.noncompat_width_pixels,
        })
    }
}
