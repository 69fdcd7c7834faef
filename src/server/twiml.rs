//! Minimal voice-markup (TwiML) documents

/// Content type the platform expects for voice-markup responses
pub const CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say(String),
    Dial {
        caller_id: Option<String>,
        number: String,
    },
    Hangup,
}

/// Builder for a `<Response>` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    /// Bridge the call to a phone number
    pub fn dial(mut self, caller_id: Option<&str>, number: impl Into<String>) -> Self {
        self.verbs.push(Verb::Dial {
            caller_id: caller_id.map(str::to_string),
            number: number.into(),
        });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    /// Announce `message` and hang up
    pub fn announce_and_hangup(message: &str) -> Self {
        Self::new().say(message).hangup()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    xml.push_str("<Say>");
                    xml.push_str(&escape(text));
                    xml.push_str("</Say>");
                }
                Verb::Dial { caller_id, number } => {
                    match caller_id {
                        Some(id) => {
                            xml.push_str(r#"<Dial callerId=""#);
                            xml.push_str(&escape(id));
                            xml.push_str(r#"">"#);
                        }
                        None => xml.push_str("<Dial>"),
                    }
                    xml.push_str("<Number>");
                    xml.push_str(&escape(number));
                    xml.push_str("</Number></Dial>");
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape text and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_with_caller_id() {
        let xml = VoiceResponse::new()
            .dial(Some("+15550000000"), "+15551234567")
            .to_xml();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Dial callerId="+15550000000"><Number>+15551234567</Number></Dial></Response>"#
        );
    }

    #[test]
    fn dial_without_caller_id_omits_attribute() {
        let xml = VoiceResponse::new().dial(None, "100").to_xml();
        assert!(xml.contains("<Dial><Number>100</Number></Dial>"));
    }

    #[test]
    fn announcement_hangs_up() {
        let xml = VoiceResponse::announce_and_hangup("Goodbye.").to_xml();
        assert!(xml.ends_with("<Response><Say>Goodbye.</Say><Hangup/></Response>"));
    }

    #[test]
    fn markup_in_input_is_escaped() {
        let xml = VoiceResponse::new()
            .dial(Some("\"quoted\""), "<Hangup/>&1")
            .to_xml();
        assert!(xml.contains(r#"callerId="&quot;quoted&quot;""#));
        assert!(xml.contains("<Number>&lt;Hangup/&gt;&amp;1</Number>"));
        assert!(!xml.contains("<Number><Hangup/>"));
    }
}
