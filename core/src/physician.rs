//! Physician (doctor code) roster lookup.

use serde_json::{json, Map, Value};

use crate::client::OrcaClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::result::{OrcaResult, SuccessPolicy};

pub const PATH: &str = "/api01rv2/system01lstv2";
pub const REQUEST_NAME: &str = "system01_managereq";

/// Build a roster request as of `base_date` (`YYYY-mm-dd`, or `""` for today).
pub fn build_list(client: &OrcaClient, base_date: &str) -> Result<HttpRequest, ApiError> {
    let mut body = Map::new();
    body.insert("Request_Number".into(), json!("02"));
    body.insert("Base_Date".into(), Value::String(base_date.to_string()));
    client.build_call(PATH, REQUEST_NAME, body)
}

pub fn parse_list(client: &OrcaClient, response: HttpResponse) -> Result<OrcaResult, ApiError> {
    client.parse_result(response, SuccessPolicy::default())
}

/// Roster lookups over a host transport.
#[derive(Debug)]
pub struct PhysicianService<'a, T> {
    client: &'a OrcaClient,
    transport: &'a T,
}

impl<'a, T: Transport> PhysicianService<'a, T> {
    pub fn new(client: &'a OrcaClient, transport: &'a T) -> Self {
        Self { client, transport }
    }

    pub fn list(&self, base_date: &str) -> Result<OrcaResult, ApiError> {
        let request = build_list(self.client, base_date)?;
        let response = self
            .transport
            .execute(request)
            .map_err(ApiError::transport)?;
        parse_list(self.client, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_list_request() {
        let client = OrcaClient::new("http://orca", "K0");
        let req = build_list(&client, "2026-10-16").unwrap();
        assert_eq!(req.path, "http://orca/api01rv2/system01lstv2");
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({"system01_managereq": {"Request_Number": "02", "Base_Date": "2026-10-16"}})
        );
    }

    #[test]
    fn parse_list_trims_roster() {
        let client = OrcaClient::new("http://orca", "K0");
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"system01_managereq":{
                "Api_Result":"00",
                "Physician_Information":[{"Code":"10001","WholeName":"Doctor A"},{},{}]
            }}"#
            .to_string(),
        };
        let res = parse_list(&client, response).unwrap();
        assert!(res.succeeded());
        let roster = res.field("physician_information").unwrap().as_array().unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0]["WholeName"], "Doctor A");
    }
}
