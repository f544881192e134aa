use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Webhook {
    pub name: String,
    pub display_name: String,
    pub timeout: Option<String>,
    pub generic_web_service: Option<GenericWebService>,
    pub service_directory: Option<ServiceDirectory>,
}

impl Webhook {
    /// Service-directory webhooks carry their endpoint inside the directory config.
    pub fn url(&self) -> Option<&str> {
        let web_service = match &self.service_directory {
            Some(directory) => directory.generic_web_service.as_ref(),
            None => self.generic_web_service.as_ref(),
        };
        web_service.map(|service| service.uri.as_str())
    }

    pub fn service_directory_name(&self) -> Option<&str> {
        self.service_directory.as_ref().map(|directory| directory.service.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenericWebService {
    pub uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDirectory {
    pub service: String,
    pub generic_web_service: Option<GenericWebService>,
}
