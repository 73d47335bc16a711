use serde::{Deserialize, Serialize};

/// Dedup fingerprint (64-char lowercase blake3 hex).
pub type DedupKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "compra")]
    Purchase,
    #[serde(rename = "aluguel")]
    Rental,
}

impl Operation {
    /// Menu choice as typed by the user ("1" / "2").
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(Self::Purchase),
            "2" => Some(Self::Rental),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "compra" => Some(Self::Purchase),
            "aluguel" => Some(Self::Rental),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "compra",
            Self::Rental => "aluguel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "casa")]
    House,
    #[serde(rename = "apartamento")]
    Apartment,
    #[serde(rename = "outro")]
    Other,
}

impl PropertyType {
    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "casa" => Some(Self::House),
            "apartamento" => Some(Self::Apartment),
            "outro" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "casa",
            Self::Apartment => "apartamento",
            Self::Other => "outro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "baixa")]
    Low,
}

impl Urgency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "alta" => Some(Self::High),
            "media" => Some(Self::Medium),
            "baixa" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "alta",
            Self::Medium => "media",
            Self::Low => "baixa",
        }
    }
}

/// A completed funnel: every field normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "operacao")]
    pub operation: Operation,
    #[serde(rename = "tipo_imovel")]
    pub property_type: PropertyType,
    #[serde(rename = "metragem")]
    pub area: u64,
    #[serde(rename = "quartos")]
    pub bedrooms: u64,
    #[serde(rename = "faixa_preco")]
    pub price_range: String,
    #[serde(rename = "urgencia")]
    pub urgency: Urgency,
}

/// Campaign attribution captured when the session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_term: String,
    pub utm_content: String,
}

impl Attribution {
    /// Parse a `utm_source=x&utm_medium=y` style string. Unknown keys and
    /// malformed pairs are ignored; a leading `?` is allowed.
    pub fn parse(query: &str) -> Self {
        let mut attribution = Self::default();
        for pair in query.trim().trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "utm_source" => attribution.utm_source = value,
                "utm_medium" => attribution.utm_medium = value,
                "utm_campaign" => attribution.utm_campaign = value,
                "utm_term" => attribution.utm_term = value,
                "utm_content" => attribution.utm_content = value,
                _ => {}
            }
        }
        attribution
    }
}

/// One persisted row: the lead plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub id: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub origin: String,
    pub attribution: Attribution,
    pub dedup_key: DedupKey,
    pub lead: LeadRecord,
}

/// Which file ended up holding the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreLocation {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Created,
    Updated,
    /// Dedup waived: the row was blindly appended to the secondary store.
    AppendedFallback,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::AppendedFallback => "appended_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub location: StoreLocation,
    /// File name (not full path) of the store that took the write.
    pub file_name: String,
    pub status: StoreStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_parse() {
        let a = Attribution::parse("?utm_source=instagram&utm_medium=cpc&utm_campaign=verao&foo=bar&broken");
        assert_eq!(a.utm_source, "instagram");
        assert_eq!(a.utm_medium, "cpc");
        assert_eq!(a.utm_campaign, "verao");
        assert_eq!(a.utm_term, "");
        assert_eq!(a.utm_content, "");
    }

    #[test]
    fn test_attribution_parse_empty() {
        assert_eq!(Attribution::parse(""), Attribution::default());
    }

    #[test]
    fn test_enum_tokens() {
        assert_eq!(PropertyType::parse(" APARTAMENTO"), Some(PropertyType::Apartment));
        assert_eq!(Urgency::parse("Baixa").map(|u| u.as_str()), Some("baixa"));
        assert_eq!(Operation::from_choice("2"), Some(Operation::Rental));
        assert_eq!(
            serde_json::to_string(&Operation::Purchase).unwrap(),
            "\"compra\""
        );
    }
}
