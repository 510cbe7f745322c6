use crate::client_info::ClientInfo;
use crate::config::DownstreamConfig;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::convert::Infallible;
use url::Url;

/// Custom case field holding the details plus the client description.
pub const CASE_COMMENT_FIELD: &str = "00N3j00000FccHG";

pub const CASE_STATUS_NEW: &str = "New";
pub const CASE_TYPE_REQUEST: &str = "Request";

/// Web form payload. Every field is optional and anything that is not a string
/// is treated as empty. The payload itself must be a JSON object.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Map<String, Value>")]
pub struct FormSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: String,
    pub company_name: String,
    pub subject: String,
    pub details: String,
}

impl TryFrom<Map<String, Value>> for FormSubmission {
    type Error = Infallible;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut field = |key: &str| match map.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        Ok(FormSubmission {
            first_name: field("firstName"),
            last_name: field("lastName"),
            email_address: field("emailAddress"),
            phone_number: field("phoneNumber"),
            company_name: field("companyName"),
            subject: field("subject"),
            details: field("details"),
        })
    }
}

/// Debug switches understood by the downstream API outside of production.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugFields {
    pub debug_email: String,
}

/// Flat record in the field layout of the downstream form endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseRecord {
    pub debug: Option<DebugFields>,
    pub org_id: String,
    pub status: &'static str,
    pub case_type: &'static str,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub description: String,
    pub comment: String,
}

impl CaseRecord {
    pub fn new(
        form: FormSubmission,
        client_info: &ClientInfo,
        downstream: &DownstreamConfig,
    ) -> Self {
        let debug = match downstream.environment.is_production() {
            true => None,
            false => Some(DebugFields {
                debug_email: downstream.debug_email.clone().unwrap_or_default(),
            }),
        };

        CaseRecord {
            debug,
            org_id: downstream.org_id.clone(),
            status: CASE_STATUS_NEW,
            case_type: CASE_TYPE_REQUEST,
            name: format!("{} {}", form.first_name, form.last_name),
            company: form.company_name,
            email: form.email_address,
            phone: form.phone_number,
            subject: form.subject,
            comment: case_comment(&form.details, client_info),
            description: form.details,
        }
    }

    /// Field pairs in the order they are sent; debug fields come first.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::with_capacity(12);
        if let Some(debug) = &self.debug {
            fields.push(("debug", "1"));
            fields.push(("debugEmail", debug.debug_email.as_str()));
        }
        fields.extend([
            ("orgid", self.org_id.as_str()),
            ("status", self.status),
            ("type", self.case_type),
            ("name", self.name.as_str()),
            ("company", self.company.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("subject", self.subject.as_str()),
            ("description", self.description.as_str()),
            (CASE_COMMENT_FIELD, self.comment.as_str()),
        ]);
        fields
    }

    /// The submission endpoint with this record appended to its query string.
    /// Parameters already on the endpoint are kept in front.
    pub fn submit_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut().extend_pairs(self.fields());
        url
    }
}

/// Details text, a blank line, then one `key: value` line per client info entry.
fn case_comment(details: &str, client_info: &ClientInfo) -> String {
    let mut comment = String::from(details);
    comment.push('\n');
    for (key, value) in client_info.entries() {
        comment.push('\n');
        comment.push_str(key);
        comment.push_str(": ");
        comment.push_str(&value);
    }
    comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::testutils::test_config;
    use std::collections::HashMap;

    fn client_info() -> ClientInfo {
        ClientInfo {
            country: "US".into(),
            asn: 13335,
            origin_pop: "SJC".into(),
            browser: Some("Chrome 120.0.0.0".into()),
            device: None,
            os: Some("Windows 10".into()),
            raw_user_agent: Some("Mozilla/5.0 (Windows NT 10.0)".into()),
        }
    }

    fn form() -> FormSubmission {
        serde_json::from_str(
            r#"{
                "firstName": "Ada",
                "lastName": "Lovelace",
                "emailAddress": "ada@example.com",
                "phoneNumber": "+1 555 0100",
                "companyName": "Analytical Engines",
                "subject": "Printer on fire",
                "details": "It is still on fire."
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lenient_form_parsing() {
        let form: FormSubmission = serde_json::from_str(
            r#"{"firstName": 42, "lastName": null, "subject": "Hi", "extra": true}"#,
        )
        .unwrap();

        assert_eq!(form.first_name, "");
        assert_eq!(form.last_name, "");
        assert_eq!(form.subject, "Hi");
        assert_eq!(form.details, "");

        assert!(serde_json::from_str::<FormSubmission>("[]").is_err());
        assert!(
            serde_json::from_str::<FormSubmission>(r#"["Ada", "Lovelace", "a@b.c"]"#).is_err()
        );
        assert!(serde_json::from_str::<FormSubmission>(r#""Ada""#).is_err());
        assert!(serde_json::from_str::<FormSubmission>("not json").is_err());
    }

    #[test]
    fn test_case_record_fields() {
        let config = test_config();
        let record = CaseRecord::new(form(), &client_info(), &config.downstream);

        assert_eq!(record.debug, None);
        assert_eq!(record.org_id, config.downstream.org_id);
        assert_eq!(record.status, "New");
        assert_eq!(record.case_type, "Request");
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.company, "Analytical Engines");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.phone, "+1 555 0100");
        assert_eq!(record.subject, "Printer on fire");
        assert_eq!(record.description, "It is still on fire.");

        let keys: Vec<_> = record.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "orgid",
                "status",
                "type",
                "name",
                "company",
                "email",
                "phone",
                "subject",
                "description",
                CASE_COMMENT_FIELD
            ]
        );
    }

    #[test]
    fn test_empty_names_join_to_single_space() {
        let config = test_config();
        let record =
            CaseRecord::new(FormSubmission::default(), &client_info(), &config.downstream);

        assert_eq!(record.name, " ");
        assert_eq!(record.company, "");
    }

    #[test]
    fn test_comment_lists_client_info() {
        let config = test_config();
        let record = CaseRecord::new(form(), &client_info(), &config.downstream);

        assert_eq!(
            record.comment,
            "It is still on fire.\n\
             \n\
             Country: US\n\
             ASN: 13335\n\
             OriginPOP: SJC\n\
             Browser: Chrome 120.0.0.0\n\
             OS: Windows 10\n\
             RawUserAgent: Mozilla/5.0 (Windows NT 10.0)"
        );
    }

    #[test]
    fn test_development_adds_debug_fields_first() {
        let mut config = test_config();
        config.downstream.environment = Environment::Development;
        config.downstream.debug_email = Some("debug@example.com".into());
        let record = CaseRecord::new(form(), &client_info(), &config.downstream);

        let fields = record.fields();
        assert_eq!(fields[0], ("debug", "1"));
        assert_eq!(fields[1], ("debugEmail", "debug@example.com"));
        assert_eq!(fields[2].0, "orgid");
    }

    #[test]
    fn test_submit_url_carries_every_field() {
        let config = test_config();
        let record = CaseRecord::new(form(), &client_info(), &config.downstream);
        let url = record.submit_url(&config.downstream.submit_url);

        assert_eq!(url.path(), config.downstream.submit_url.path());
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 10);
        assert_eq!(query["name"], "Ada Lovelace");
        assert_eq!(query["type"], "Request");
        assert_eq!(query[CASE_COMMENT_FIELD], record.comment);
        assert!(url.query().unwrap().starts_with("orgid="));
    }

    #[test]
    fn test_submit_url_keeps_endpoint_query() {
        let config = test_config();
        let record = CaseRecord::new(form(), &client_info(), &config.downstream);
        let endpoint =
            Url::parse("https://webto.salesforce.com/servlet/servlet.WebToCase?encoding=UTF-8")
                .unwrap();
        let url = record.submit_url(&endpoint);

        let query = url.query().unwrap();
        assert!(query.starts_with("encoding=UTF-8&orgid=00D000000000001&"));
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.len(), 11);
        assert_eq!(pairs["encoding"], "UTF-8");
        assert_eq!(pairs["email"], "ada@example.com");
    }
}
