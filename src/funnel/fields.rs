use serde::{Deserialize, Serialize};

/// One slot of the intake funnel. Declaration order is funnel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    #[serde(rename = "nome")]
    Name,
    #[serde(rename = "telefone")]
    Phone,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "operacao")]
    Operation,
    #[serde(rename = "tipo_imovel")]
    PropertyType,
    #[serde(rename = "metragem")]
    Area,
    #[serde(rename = "quartos")]
    Bedrooms,
    #[serde(rename = "faixa_preco")]
    PriceRange,
    #[serde(rename = "urgencia")]
    Urgency,
}

/// Number of fields; also the terminal step index.
pub const FIELD_COUNT: usize = 9;

/// The full funnel, in order.
pub const FUNNEL: [FieldKey; FIELD_COUNT] = [
    FieldKey::Name,
    FieldKey::Phone,
    FieldKey::Email,
    FieldKey::Operation,
    FieldKey::PropertyType,
    FieldKey::Area,
    FieldKey::Bedrooms,
    FieldKey::PriceRange,
    FieldKey::Urgency,
];

/// Fallback error for keys without a dedicated message.
pub const GENERIC_ERROR: &str = "A resposta não é válida. Tente novamente.";

impl FieldKey {
    /// Field at a funnel position, `None` past the end.
    pub fn at(position: usize) -> Option<Self> {
        FUNNEL.get(position).copied()
    }

    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Column/answer key as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "nome",
            Self::Phone => "telefone",
            Self::Email => "email",
            Self::Operation => "operacao",
            Self::PropertyType => "tipo_imovel",
            Self::Area => "metragem",
            Self::Bedrooms => "quartos",
            Self::PriceRange => "faixa_preco",
            Self::Urgency => "urgencia",
        }
    }

    #[cfg(test)]
    pub fn from_key(key: &str) -> Option<Self> {
        FUNNEL.iter().copied().find(|f| f.as_str() == key)
    }

    /// Canonical prompt. Front-ends must send this verbatim when no
    /// paraphrase is available.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Name => "Qual é o seu nome completo?",
            Self::Phone => "Informe seu telefone com DDD (11 dígitos, ex: 11987654321):",
            Self::Email => "Qual é o seu e-mail?",
            Self::Operation => {
                "Você deseja comprar ou alugar? (Digite 1 para Compra ou 2 para Aluguel)"
            }
            Self::PropertyType => "Qual tipo de imóvel você procura? (casa, apartamento ou outro)",
            Self::Area => "Qual a metragem desejada? (apenas números, ex: 80)",
            Self::Bedrooms => "Quantos quartos você deseja? (apenas números)",
            Self::PriceRange => {
                "Qual a faixa de preço que você tem em mente? (pode responder livremente)"
            }
            Self::Urgency => "Qual é a urgência da sua busca? (alta, media, baixa)",
        }
    }

    /// Message shown when an answer for this field is rejected.
    pub fn error_message(&self) -> &'static str {
        match self {
            Self::Name => "Por favor, informe nome e sobrenome.",
            Self::Phone => "Telefone deve ter 11 dígitos (DDD + número), ex.: 11987654321.",
            Self::Email => "Digite um e-mail válido, ex.: nome@dominio.com.",
            Self::Operation => "Responda com 1 (Compra) ou 2 (Aluguel).",
            Self::PropertyType => "Escolha entre casa, apartamento ou outro.",
            Self::Area => "Digite apenas números, ex.: 80.",
            Self::Bedrooms => "Digite apenas números, ex.: 2.",
            // Never rejected; kept for completeness of the table.
            Self::PriceRange => GENERIC_ERROR,
            Self::Urgency => "Responda alta, media ou baixa.",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_funnel_order() {
        for (i, field) in FUNNEL.iter().enumerate() {
            assert_eq!(field.position(), i);
            assert_eq!(FieldKey::at(i), Some(*field));
        }
        assert_eq!(FieldKey::at(FIELD_COUNT), None);
    }

    #[test]
    fn test_keys_are_unique_and_resolvable() {
        let keys: std::collections::HashSet<_> = FUNNEL.iter().map(|f| f.as_str()).collect();
        assert_eq!(keys.len(), FIELD_COUNT);
        assert_eq!(FieldKey::from_key("tipo_imovel"), Some(FieldKey::PropertyType));
        assert_eq!(FieldKey::from_key("bairro"), None);
    }

    #[test]
    fn test_serde_uses_column_keys() {
        let json = serde_json::to_string(&FieldKey::PriceRange).unwrap();
        assert_eq!(json, "\"faixa_preco\"");
    }
}
