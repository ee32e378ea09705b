use serde::{Deserialize, Serialize};

/// Customer contact details keyed by WhatsApp number, used to prefill
/// booking forms. Created at first booking or via the profile endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub whatsapp: String,
    pub name: String,
    pub email: Option<String>,
}
