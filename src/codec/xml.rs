//! XML-RPC payload parsing and emission.
//!
//! The wire body of a request (and of a server-initiated callback) is a
//! `<methodCall>`; a reply is a `<methodResponse>` carrying either one
//! value or a fault struct. Parsing is event-driven over `quick-xml`;
//! emission builds canonical markup directly (`i4` for integers,
//! explicit `string`, `0`/`1` booleans, no whitespace inside leaves, no
//! XML declaration).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDateTime;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::value::Value;
use crate::error::{GbxError, Result};

/// Wire format of `<dateTime.iso8601>` leaves.
const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// A decoded `<methodCall>`: a remote method name plus its parameters.
///
/// Requests travel as method calls, and so do server-initiated
/// callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Remote method name, e.g. `system.listMethods`.
    pub name: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Create a method call.
    pub fn new(name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse a `<methodCall>` payload.
    pub fn from_xml(body: &[u8]) -> Result<Self> {
        let mut reader = reader_for(body)?;

        expect_start(&mut reader, b"methodCall")?;
        expect_start(&mut reader, b"methodName")?;
        let name = read_leaf_text(&mut reader, b"methodName")?;

        let mut params = Vec::new();
        match next_event(&mut reader)? {
            Event::Start(e) if tag_is(&e, b"params") => {
                loop {
                    match next_event(&mut reader)? {
                        Event::Start(p) if tag_is(&p, b"param") => {
                            expect_start(&mut reader, b"value")?;
                            params.push(read_value_body(&mut reader)?);
                            expect_end(&mut reader, b"param")?;
                        }
                        Event::End(e) if e.name().as_ref() == b"params" => break,
                        other => return Err(unexpected("params", &other)),
                    }
                }
                expect_end(&mut reader, b"methodCall")?;
            }
            Event::Empty(e) if tag_is(&e, b"params") => {
                expect_end(&mut reader, b"methodCall")?;
            }
            Event::End(e) if e.name().as_ref() == b"methodCall" => {}
            other => return Err(unexpected("methodCall", &other)),
        }

        Ok(Self { name, params })
    }

    /// Emit the canonical `<methodCall>` payload.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(96);
        out.push_str("<methodCall><methodName>");
        out.push_str(&escape(self.name.as_str()));
        out.push_str("</methodName>");
        if self.params.is_empty() {
            out.push_str("<params/>");
        } else {
            out.push_str("<params>");
            for param in &self.params {
                out.push_str("<param>");
                write_value(&mut out, param);
                out.push_str("</param>");
            }
            out.push_str("</params>");
        }
        out.push_str("</methodCall>");
        out
    }
}

/// A decoded `<methodResponse>`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// Normal response carrying a single value.
    Success(Value),
    /// XML-RPC fault (`faultCode` / `faultString` struct).
    Fault {
        /// `faultCode` member.
        code: i32,
        /// `faultString` member.
        message: String,
    },
}

impl MethodResponse {
    /// Parse a `<methodResponse>` payload.
    pub fn from_xml(body: &[u8]) -> Result<Self> {
        let mut reader = reader_for(body)?;

        expect_start(&mut reader, b"methodResponse")?;
        let response = match next_event(&mut reader)? {
            Event::Start(e) if tag_is(&e, b"params") => {
                expect_start(&mut reader, b"param")?;
                expect_start(&mut reader, b"value")?;
                let value = read_value_body(&mut reader)?;
                expect_end(&mut reader, b"param")?;
                expect_end(&mut reader, b"params")?;
                MethodResponse::Success(value)
            }
            Event::Start(e) if tag_is(&e, b"fault") => {
                expect_start(&mut reader, b"value")?;
                let value = read_value_body(&mut reader)?;
                expect_end(&mut reader, b"fault")?;
                let code = value
                    .member("faultCode")
                    .and_then(Value::as_i32)
                    .ok_or_else(|| GbxError::Decode("fault without integer faultCode".into()))?;
                let message = value
                    .member("faultString")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                MethodResponse::Fault { code, message }
            }
            other => return Err(unexpected("methodResponse", &other)),
        };
        expect_end(&mut reader, b"methodResponse")?;
        Ok(response)
    }

    /// Emit the canonical `<methodResponse>` payload.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(96);
        out.push_str("<methodResponse>");
        match self {
            MethodResponse::Success(value) => {
                out.push_str("<params><param>");
                write_value(&mut out, value);
                out.push_str("</param></params>");
            }
            MethodResponse::Fault { code, message } => {
                out.push_str("<fault>");
                write_value(
                    &mut out,
                    &Value::Struct(vec![
                        ("faultCode".to_string(), Value::Int(*code)),
                        ("faultString".to_string(), Value::String(message.clone())),
                    ]),
                );
                out.push_str("</fault>");
            }
        }
        out.push_str("</methodResponse>");
        out
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            out.push_str("<i4>");
            out.push_str(&i.to_string());
            out.push_str("</i4>");
        }
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push_str(if *b { "1" } else { "0" });
            out.push_str("</boolean>");
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Double(d) => {
            out.push_str("<double>");
            out.push_str(&d.to_string());
            out.push_str("</double>");
        }
        Value::DateTime(dt) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&dt.format(DATETIME_FORMAT).to_string());
            out.push_str("</dateTime.iso8601>");
        }
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&BASE64.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn reader_for(body: &[u8]) -> Result<Reader<&[u8]>> {
    let text = std::str::from_utf8(body)
        .map_err(|e| GbxError::Decode(format!("payload is not valid UTF-8: {e}")))?;
    Ok(Reader::from_str(text))
}

fn xml_err(e: impl std::fmt::Display) -> GbxError {
    GbxError::Decode(format!("malformed XML: {e}"))
}

fn tag_is(start: &BytesStart<'_>, tag: &[u8]) -> bool {
    start.name().as_ref() == tag
}

fn unexpected(context: &str, event: &Event<'_>) -> GbxError {
    let what = match event {
        Event::Start(e) => format!("<{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Empty(e) => format!("<{}/>", String::from_utf8_lossy(e.name().as_ref())),
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) | Event::CData(_) => "text content".to_string(),
        Event::Eof => "end of document".to_string(),
        _ => "markup".to_string(),
    };
    GbxError::Decode(format!("unexpected {what} inside {context}"))
}

/// Next event that carries meaning: declarations, comments, processing
/// instructions and whitespace-only text are formatting and skipped.
fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Text(t) => {
                if t.unescape().map_err(xml_err)?.trim().is_empty() {
                    continue;
                }
                return Ok(Event::Text(t));
            }
            event => return Ok(event),
        }
    }
}

fn expect_start(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<()> {
    match next_event(reader)? {
        Event::Start(e) if tag_is(&e, tag) => Ok(()),
        other => Err(unexpected(&format!("<{}>", String::from_utf8_lossy(tag)), &other)),
    }
}

fn expect_end(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<()> {
    match next_event(reader)? {
        Event::End(e) if e.name().as_ref() == tag => Ok(()),
        other => Err(unexpected(
            &format!("</{}>", String::from_utf8_lossy(tag)),
            &other,
        )),
    }
}

/// Collect the character data of a leaf element through its end tag.
/// Leaf text is content: entities are resolved, whitespace is kept.
fn read_leaf_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(xml_err)?),
            Event::CData(c) => {
                let raw = c.into_inner();
                let chunk = std::str::from_utf8(&raw)
                    .map_err(|e| GbxError::Decode(format!("CDATA is not valid UTF-8: {e}")))?;
                text.push_str(chunk);
            }
            Event::Comment(_) => continue,
            Event::End(e) if e.name().as_ref() == tag => return Ok(text),
            Event::Eof => {
                return Err(GbxError::Decode(format!(
                    "document truncated inside <{}>",
                    String::from_utf8_lossy(tag)
                )))
            }
            other => return Err(unexpected(&format!("<{}>", String::from_utf8_lossy(tag)), &other)),
        }
    }
}

/// Read a value, positioned just after `<value>`; consumes `</value>`.
///
/// Inside `<value>` either a typed element appears, or bare character
/// data which is a string. Whitespace-only text before a typed element
/// is formatting; once real character data shows up it is string
/// content and kept verbatim.
fn read_value_body(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut bare_text: Option<String> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => {
                let chunk = t.unescape().map_err(xml_err)?;
                if bare_text.is_none() && chunk.trim().is_empty() {
                    continue;
                }
                bare_text.get_or_insert_with(String::new).push_str(&chunk);
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let chunk = std::str::from_utf8(&raw)
                    .map_err(|e| GbxError::Decode(format!("CDATA is not valid UTF-8: {e}")))?;
                bare_text.get_or_insert_with(String::new).push_str(chunk);
            }
            Event::Comment(_) => continue,
            Event::Start(e) => {
                if bare_text.is_some() {
                    return Err(GbxError::Decode("mixed content inside <value>".into()));
                }
                let value = read_typed(reader, &e.name().as_ref().to_vec())?;
                expect_end(reader, b"value")?;
                return Ok(value);
            }
            Event::Empty(e) => {
                if bare_text.is_some() {
                    return Err(GbxError::Decode("mixed content inside <value>".into()));
                }
                let value = empty_typed(e.name().as_ref())?;
                expect_end(reader, b"value")?;
                return Ok(value);
            }
            Event::End(e) if e.name().as_ref() == b"value" => {
                return Ok(Value::String(bare_text.unwrap_or_default()));
            }
            Event::Eof => return Err(GbxError::Decode("document truncated inside <value>".into())),
            other => return Err(unexpected("<value>", &other)),
        }
    }
}

/// Read a typed element's content, positioned after its start tag;
/// consumes the matching end tag.
fn read_typed(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<Value> {
    match tag {
        b"i4" | b"int" => {
            let text = read_leaf_text(reader, tag)?;
            text.trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| GbxError::Decode(format!("invalid integer literal {text:?}")))
        }
        b"boolean" => {
            let text = read_leaf_text(reader, tag)?;
            match text.trim() {
                "0" => Ok(Value::Bool(false)),
                "1" => Ok(Value::Bool(true)),
                other => Err(GbxError::Decode(format!(
                    "invalid boolean literal {other:?}"
                ))),
            }
        }
        b"string" => Ok(Value::String(read_leaf_text(reader, tag)?)),
        b"double" => {
            let text = read_leaf_text(reader, tag)?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(GbxError::Decode("empty double literal".into()));
            }
            trimmed
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| GbxError::Decode(format!("invalid double literal {text:?}")))
        }
        b"dateTime.iso8601" => {
            let text = read_leaf_text(reader, tag)?;
            let trimmed = text.trim();
            NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
                .map(Value::DateTime)
                .map_err(|_| GbxError::Decode(format!("invalid date-time literal {text:?}")))
        }
        b"base64" => {
            let text = read_leaf_text(reader, tag)?;
            let compact: String = text.split_whitespace().collect();
            BASE64
                .decode(compact.as_bytes())
                .map(Value::Base64)
                .map_err(|e| GbxError::Decode(format!("invalid base64: {e}")))
        }
        b"array" => read_array(reader),
        b"struct" => read_struct(reader),
        other => Err(GbxError::Decode(format!(
            "unknown value element <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// A self-closing typed element.
fn empty_typed(tag: &[u8]) -> Result<Value> {
    match tag {
        b"string" => Ok(Value::String(String::new())),
        b"base64" => Ok(Value::Base64(Vec::new())),
        b"array" => Ok(Value::Array(Vec::new())),
        b"struct" => Ok(Value::Struct(Vec::new())),
        other => Err(GbxError::Decode(format!(
            "empty <{}/> has no value",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Read `<data>…</data></array>`, positioned after `<array>`.
fn read_array(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut items = Vec::new();
    match next_event(reader)? {
        Event::Start(e) if tag_is(&e, b"data") => loop {
            match next_event(reader)? {
                Event::Start(v) if tag_is(&v, b"value") => items.push(read_value_body(reader)?),
                Event::Empty(v) if tag_is(&v, b"value") => items.push(Value::String(String::new())),
                Event::End(e) if e.name().as_ref() == b"data" => break,
                other => return Err(unexpected("<data>", &other)),
            }
        },
        Event::Empty(e) if tag_is(&e, b"data") => {}
        other => return Err(unexpected("<array>", &other)),
    }
    expect_end(reader, b"array")?;
    Ok(Value::Array(items))
}

/// Read struct members through `</struct>`, positioned after `<struct>`.
/// Duplicate member names are accepted with last-write-wins and reported
/// as a parse warning.
fn read_struct(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut members: Vec<(String, Value)> = Vec::new();
    loop {
        match next_event(reader)? {
            Event::Start(e) if tag_is(&e, b"member") => {
                expect_start(reader, b"name")?;
                let name = read_leaf_text(reader, b"name")?;
                expect_start(reader, b"value")?;
                let value = read_value_body(reader)?;
                expect_end(reader, b"member")?;

                if let Some(existing) = members.iter_mut().find(|(k, _)| *k == name) {
                    tracing::warn!(member = %name, "duplicate struct member, last value wins");
                    existing.1 = value;
                } else {
                    members.push((name, value));
                }
            }
            Event::End(e) if e.name().as_ref() == b"struct" => break,
            other => return Err(unexpected("<struct>", &other)),
        }
    }
    Ok(Value::Struct(members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn roundtrip(value: Value) {
        let call = MethodCall::new("echo", vec![value.clone()]);
        let xml = call.to_xml();
        let parsed = MethodCall::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(parsed.params.len(), 1, "payload: {xml}");
        assert_eq!(parsed.params[0], value, "payload: {xml}");
    }

    #[test]
    fn test_request_canonical_bytes() {
        // An empty parameter list is emitted as <params/>.
        let call = MethodCall::new("system.listMethods", vec![]);
        assert_eq!(
            call.to_xml(),
            "<methodCall><methodName>system.listMethods</methodName><params/></methodCall>"
        );
    }

    #[test]
    fn test_response_string_array() {
        let body = "<methodResponse><params><param><value><array><data>\
                    <value><string>a</string></value>\
                    <value><string>b</string></value>\
                    </data></array></value></param></params></methodResponse>";
        let response = MethodResponse::from_xml(body.as_bytes()).unwrap();
        assert_eq!(
            response,
            MethodResponse::Success(Value::Array(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]))
        );
    }

    #[test]
    fn test_fault_response() {
        let body = "<methodResponse><fault><value><struct>\
                    <member><name>faultCode</name><value><int>-1000</int></value></member>\
                    <member><name>faultString</name><value><string>nope</string></value></member>\
                    </struct></value></fault></methodResponse>";
        let response = MethodResponse::from_xml(body.as_bytes()).unwrap();
        assert_eq!(
            response,
            MethodResponse::Fault {
                code: -1000,
                message: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_fault_without_code_is_decode_error() {
        let body = "<methodResponse><fault><value><struct>\
                    <member><name>faultString</name><value><string>nope</string></value></member>\
                    </struct></value></fault></methodResponse>";
        assert!(matches!(
            MethodResponse::from_xml(body.as_bytes()),
            Err(GbxError::Decode(_))
        ));
    }

    #[test]
    fn test_callback_method_call() {
        let body = "<methodCall><methodName>Server.PlayerChat</methodName>\
                    <params><param><value><int>42</int></value></param></params></methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(call.name, "Server.PlayerChat");
        assert_eq!(call.params, vec![Value::Int(42)]);
    }

    #[test]
    fn test_roundtrip_scalars() {
        roundtrip(Value::Int(0));
        roundtrip(Value::Int(i32::MIN));
        roundtrip(Value::Int(i32::MAX));
        roundtrip(Value::Bool(true));
        roundtrip(Value::Bool(false));
        roundtrip(Value::String(String::new()));
        roundtrip(Value::String("plain".to_string()));
        roundtrip(Value::Double(0.5));
        roundtrip(Value::Double(-123.25));
        roundtrip(Value::Base64(b"\x00\x01\xFFbinary".to_vec()));
        roundtrip(Value::Base64(Vec::new()));
    }

    #[test]
    fn test_roundtrip_datetime() {
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        let call = MethodCall::new("echo", vec![Value::DateTime(dt)]);
        let xml = call.to_xml();
        assert!(xml.contains("<dateTime.iso8601>19980717T14:08:55</dateTime.iso8601>"));
        roundtrip(Value::DateTime(dt));
    }

    #[test]
    fn test_roundtrip_nested() {
        roundtrip(Value::Array(vec![
            Value::Int(1),
            Value::Array(vec![Value::String("deep".to_string()), Value::Bool(false)]),
            Value::Struct(vec![
                ("Login".to_string(), Value::String("rider".to_string())),
                (
                    "Score".to_string(),
                    Value::Struct(vec![("Best".to_string(), Value::Int(41333))]),
                ),
            ]),
        ]));
        roundtrip(Value::Struct(Vec::new()));
        roundtrip(Value::Array(Vec::new()));
    }

    #[test]
    fn test_roundtrip_escaped_text() {
        roundtrip(Value::String("a < b && c > \"d\"".to_string()));
        let call = MethodCall::new("chat.send <&>", vec![]);
        let parsed = MethodCall::from_xml(call.to_xml().as_bytes()).unwrap();
        assert_eq!(parsed.name, "chat.send <&>");
    }

    #[test]
    fn test_bare_text_value_is_string() {
        let body = "<methodCall><methodName>m</methodName><params>\
                    <param><value>bare text</value></param>\
                    <param><value></value></param>\
                    </params></methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(call.params[0], Value::String("bare text".to_string()));
        assert_eq!(call.params[1], Value::String(String::new()));
    }

    #[test]
    fn test_int_alias_and_whitespace_tolerance() {
        let body = "<methodCall><methodName>m</methodName>\n  <params>\n    \
                    <param>\n      <value>\n        <int> -7 </int>\n      </value>\n    </param>\n  \
                    </params>\n</methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(call.params, vec![Value::Int(-7)]);
    }

    #[test]
    fn test_string_leaf_whitespace_is_content() {
        let body = "<methodCall><methodName>m</methodName><params>\
                    <param><value><string>  padded  </string></value></param>\
                    </params></methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(call.params[0], Value::String("  padded  ".to_string()));
    }

    #[test]
    fn test_boolean_rejects_other_literals() {
        for literal in ["true", "false", "2", ""] {
            let body = format!(
                "<methodCall><methodName>m</methodName><params>\
                 <param><value><boolean>{literal}</boolean></value></param>\
                 </params></methodCall>"
            );
            assert!(
                matches!(
                    MethodCall::from_xml(body.as_bytes()),
                    Err(GbxError::Decode(_))
                ),
                "literal {literal:?} should not parse"
            );
        }
    }

    #[test]
    fn test_duplicate_struct_member_last_write_wins() {
        let body = "<methodCall><methodName>m</methodName><params><param><value><struct>\
                    <member><name>k</name><value><i4>1</i4></value></member>\
                    <member><name>k</name><value><i4>2</i4></value></member>\
                    </struct></value></param></params></methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(
            call.params[0],
            Value::Struct(vec![("k".to_string(), Value::Int(2))])
        );
    }

    #[test]
    fn test_malformed_xml_is_decode_error() {
        for body in [
            "<methodCall><methodName>m</methodName>",
            "<methodCall><methodName>m</methodName><params><param><value><i4>x</i4></value></param></params></methodCall>",
            "not xml at all",
            "<methodResponse><params></params></methodResponse>",
        ] {
            let call = MethodCall::from_xml(body.as_bytes());
            let response = MethodResponse::from_xml(body.as_bytes());
            assert!(
                call.is_err() && response.is_err(),
                "body should not parse: {body}"
            );
        }
    }

    #[test]
    fn test_fault_emission_roundtrip() {
        let fault = MethodResponse::Fault {
            code: -1000,
            message: "nope".to_string(),
        };
        let parsed = MethodResponse::from_xml(fault.to_xml().as_bytes()).unwrap();
        assert_eq!(parsed, fault);
    }

    #[test]
    fn test_response_emission_roundtrip() {
        let response = MethodResponse::Success(Value::Array(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
        ]));
        let parsed = MethodResponse::from_xml(response.to_xml().as_bytes()).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_xml_declaration_is_tolerated() {
        let body = "<?xml version=\"1.0\"?>\
                    <methodCall><methodName>m</methodName><params/></methodCall>";
        let call = MethodCall::from_xml(body.as_bytes()).unwrap();
        assert_eq!(call.name, "m");
        assert!(call.params.is_empty());
    }
}
