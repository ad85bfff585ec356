//! Field rendering for notification payloads
//!
//! Every field kind maps to a short mrkdwn text. Structured values go
//! through YAML so they read as a key/value block in chat clients.

use crate::core::error::{LoggerError, Result};
use crate::core::field::{Field, FieldValue, Float, Integer};
use crate::stackdriver::schema::{ERROR_KEY, SERVICE_CONTEXT_KEY};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{Local, SecondsFormat};

/// One field as it appears in a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub label: String,
    pub text: String,
}

impl RenderedField {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// `*label*` on the first line, the value below
    pub fn to_mrkdwn(&self) -> String {
        format!("*{}*\n{}", self.label, self.text)
    }
}

/// Rendered field set: the pinned `error` field and the sorted body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFields {
    pub error: Option<RenderedField>,
    pub body: Vec<RenderedField>,
}

impl RenderedFields {
    pub fn len(&self) -> usize {
        self.body.len() + usize::from(self.error.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render all fields. The first failure aborts the whole payload.
pub fn render_fields(fields: &[Field]) -> Result<RenderedFields> {
    let mut out = RenderedFields::default();
    for field in fields {
        let Some(rendered) = render_field(field)? else {
            continue;
        };
        if field.key == ERROR_KEY {
            out.error = Some(rendered);
        } else {
            out.body.push(rendered);
        }
    }
    out.body.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(out)
}

/// Render one field; `None` means the field is left out of the payload.
pub fn render_field(field: &Field) -> Result<Option<RenderedField>> {
    if field.key == SERVICE_CONTEXT_KEY {
        // Already shown in the metadata row
        return Ok(None);
    }
    let text = match &field.value {
        FieldValue::String(s) => s.clone(),
        FieldValue::Int(i) => render_integer(i),
        FieldValue::Float(f) => render_float(f),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Duration(d) => format!("{:?}", d),
        FieldValue::Time(t) => format!(
            "time={} ({})",
            t.with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            t.timestamp()
        ),
        FieldValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        FieldValue::Binary(b) => BASE64.encode(b),
        FieldValue::Object(v) | FieldValue::Array(v) | FieldValue::Reflected(v) => {
            let yaml = serde_yaml::to_string(v)
                .map_err(|e| LoggerError::render(field.key.clone(), e.to_string()))?;
            if is_empty_document(&yaml) {
                return Ok(None);
            }
            format!("```{}```", yaml)
        }
        FieldValue::Error(e) => e.to_string(),
    };
    Ok(Some(RenderedField::new(field.key.clone(), text)))
}

/// `<kind>=<hex> (<decimal>)` where kind is the Rust width name (`i64`,
/// `u8`, ...). Negative values put the sign before the prefix:
/// `i32=-0x10 (-16)`.
fn render_integer(i: &Integer) -> String {
    let v = i.as_i128();
    let sign = if v < 0 { "-" } else { "" };
    format!("{}={}0x{:x} ({})", i.kind(), sign, v.unsigned_abs(), v)
}

fn render_float(f: &Float) -> String {
    match f {
        Float::F32(v) => format!("{}={:.6}", f.kind(), v),
        Float::F64(v) => format!("{}={:.6}", f.kind(), v),
    }
}

fn is_empty_document(yaml: &str) -> bool {
    matches!(yaml.trim(), "" | "{}" | "[]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn text(field: Field) -> String {
        render_field(&field).unwrap().unwrap().text
    }

    #[test]
    fn test_integers_hex_and_decimal() {
        assert_eq!(text(Field::int("n", 255_i64)), "i64=0xff (255)");
        assert_eq!(text(Field::int("n", 10_u8)), "u8=0xa (10)");
        assert_eq!(text(Field::int("n", -16_i32)), "i32=-0x10 (-16)");
        assert_eq!(
            text(Field::int("n", u64::MAX)),
            "u64=0xffffffffffffffff (18446744073709551615)"
        );
    }

    #[test]
    fn test_floats_fixed_point() {
        assert_eq!(text(Field::float("f", 1.5_f64)), "f64=1.500000");
        assert_eq!(text(Field::float("f", 0.25_f32)), "f32=0.250000");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(text(Field::bool("b", true)), "true");
        assert_eq!(text(Field::duration("d", Duration::from_millis(1500))), "1.5s");
        assert_eq!(text(Field::bytes("raw", b"plain text".to_vec())), "plain text");
        assert_eq!(text(Field::binary("bin", b"hi".to_vec())), "aGk=");
        assert_eq!(text(Field::string("s", "hello")), "hello");
    }

    #[test]
    fn test_time_local_rfc3339_with_epoch() {
        let t = Utc.with_ymd_and_hms(2021, 9, 6, 7, 10, 52).unwrap();
        let rendered = text(Field::time("at", t));
        assert!(rendered.starts_with("time="));
        assert!(rendered.ends_with("(1630912252)"));
    }

    #[test]
    fn test_structured_as_yaml_block() {
        let rendered = text(Field::object("req", &json!({"status": 200})));
        assert_eq!(rendered, "```status: 200\n```");
    }

    #[test]
    fn test_empty_structured_dropped() {
        assert!(render_field(&Field::object("o", &json!({}))).unwrap().is_none());
        assert!(render_field(&Field::array("a", &json!([]))).unwrap().is_none());
    }

    #[test]
    fn test_service_context_always_dropped() {
        let field = Field::object("serviceContext", &json!({"service": "api", "version": "1"}));
        assert!(render_field(&field).unwrap().is_none());
    }

    #[test]
    fn test_error_pinned_and_body_sorted() {
        let fields = vec![
            Field::string("zeta", "z"),
            Field::string("error", "bad thing"),
            Field::string("alpha", "a"),
            Field::object("empty", &json!({})),
        ];
        let rendered = render_fields(&fields).unwrap();

        assert_eq!(rendered.error, Some(RenderedField::new("error", "bad thing")));
        let labels: Vec<_> = rendered.body.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "zeta"]);
        assert_eq!(rendered.len(), 3);
    }

    #[test]
    fn test_mrkdwn() {
        let field = RenderedField::new("user", "alice");
        assert_eq!(field.to_mrkdwn(), "*user*\nalice");
    }
}
